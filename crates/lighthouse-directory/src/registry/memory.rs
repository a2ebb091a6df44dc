//! In-memory store implementation.

use super::{DirectoryStore, LookupRecord, RegistrationRecord, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use lighthouse_protocol::NodeId;
use tracing::debug;

/// In-memory directory store.
///
/// Both maps are sharded, so unrelated identities never contend on one
/// lock. Registration upserts happen under the key's entry lock, which
/// gives per-identity linearizability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    registrations: DashMap<NodeId, RegistrationRecord>,
    lookups: DashMap<NodeId, Vec<LookupRecord>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn put_registration(&self, record: RegistrationRecord) -> Result<(), StoreError> {
        self.registrations.insert(record.id, record);
        Ok(())
    }

    async fn get_registration(
        &self,
        id: &NodeId,
    ) -> Result<Option<RegistrationRecord>, StoreError> {
        Ok(self.registrations.get(id).map(|r| r.value().clone()))
    }

    async fn append_lookup(&self, record: LookupRecord) -> Result<(), StoreError> {
        self.lookups.entry(record.id).or_default().push(record);
        Ok(())
    }

    async fn lookups_for(&self, id: &NodeId) -> Result<Vec<LookupRecord>, StoreError> {
        Ok(self
            .lookups
            .get(id)
            .map(|v| v.value().clone())
            .unwrap_or_default())
    }

    async fn wipe(&self) -> Result<usize, StoreError> {
        let removed = self.registrations.len();
        self.registrations.clear();
        self.lookups.clear();
        debug!(removed, "Wiped in-memory store");
        Ok(removed)
    }

    async fn registration_count(&self) -> Result<usize, StoreError> {
        Ok(self.registrations.len())
    }
}
