//! Wire protocol for the lighthouse rendezvous directory.
//!
//! Used by both the directory service and its clients. Defines:
//! - The request/response payloads for the four directory operations
//! - Canonical message construction (the bytes that actually get signed,
//!   independent of transport encoding)
//! - Identity derivation and Ed25519 signature verification

pub mod crypto;
pub mod error;
pub mod types;

pub use crypto::{decode_public_key, decode_signature, derive_id, verify, Keypair};
pub use error::ProtocolError;
pub use types::{
    register_message, listconns_message, HealthResponse, ListConnsPayload, ListConnsResponse,
    LookupPayload, LookupResponse, NodeId, PeerEntry, RegisterPayload, RegisterResponse,
    WipeResponse,
};
