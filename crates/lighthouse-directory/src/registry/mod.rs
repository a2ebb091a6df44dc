//! Endpoint registry records and the storage abstraction behind them.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lighthouse_protocol::NodeId;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;

/// The live registration for an identity. Last write wins: a later valid
/// `register` for the same id replaces this record wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Identity derived from the public key, never trusted from the caller.
    pub id: NodeId,

    /// Base64-encoded public key, kept to verify later `listconns` calls.
    pub pubkey: String,

    /// The endpoint the node registered.
    pub endpoint: SocketAddr,

    /// When this registration (or its latest overwrite) happened.
    pub registered_at: DateTime<Utc>,
}

/// One successful lookup against an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRecord {
    pub id: NodeId,

    /// The querying client's endpoint.
    pub client: SocketAddr,

    pub looked_up_at: DateTime<Utc>,
}

/// Backing-store failure. The facade retries these a bounded number of
/// times before surfacing `DirectoryError::Internal`.
#[derive(Debug, Error)]
#[error("storage backend failure: {0}")]
pub struct StoreError(pub String);

/// Keyed store the directory runs against.
///
/// Injected at facade construction so tests and alternative deployments can
/// swap backends. Implementations must make `put_registration` atomic per
/// identity: concurrent writes for the same id resolve to exactly one of
/// them, never a torn record.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Insert or replace the registration for `record.id`.
    async fn put_registration(&self, record: RegistrationRecord) -> Result<(), StoreError>;

    /// Fetch the live registration for an identity.
    async fn get_registration(&self, id: &NodeId) -> Result<Option<RegistrationRecord>, StoreError>;

    /// Append to an identity's lookup history.
    async fn append_lookup(&self, record: LookupRecord) -> Result<(), StoreError>;

    /// Lookup history for an identity, oldest first.
    async fn lookups_for(&self, id: &NodeId) -> Result<Vec<LookupRecord>, StoreError>;

    /// Clear all registrations and lookup history. Returns the number of
    /// registrations removed.
    async fn wipe(&self) -> Result<usize, StoreError>;

    /// Number of live registrations.
    async fn registration_count(&self) -> Result<usize, StoreError>;
}
