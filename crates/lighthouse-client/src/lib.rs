//! Client library for the lighthouse rendezvous directory.
//!
//! Drives the four directory operations over HTTP, signing `register` and
//! `listconns` with a local Ed25519 keypair. Wire types come from
//! `lighthouse-protocol`, so the client and service cannot drift apart.

mod client;
mod error;

pub use client::LighthouseClient;
pub use error::ClientError;

// Re-export so callers don't need a direct lighthouse-protocol dependency.
pub use lighthouse_protocol::{Keypair, NodeId};
