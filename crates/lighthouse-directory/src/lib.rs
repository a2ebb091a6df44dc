//! Lighthouse directory service.
//!
//! Nodes register a reachable endpoint under their public key; other
//! clients resolve that identity to the endpoint to connect. The service:
//! - Authenticates mutations with Ed25519 signatures over canonical messages
//! - Rejects replayed requests via a per-identity timestamp guard
//! - Records who looked an identity up, visible only to the identity owner

pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod registry;
pub mod replay;

pub use config::Config;
pub use directory::{Directory, DirectoryPolicy};
pub use error::DirectoryError;
pub use registry::{DirectoryStore, LookupRecord, MemoryStore, RegistrationRecord, StoreError};
pub use replay::ReplayGuard;
