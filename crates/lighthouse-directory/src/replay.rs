//! Per-identity replay protection.
//!
//! Each identity has a highest committed timestamp; a signed request is
//! only committed if its timestamp is strictly greater. Per-identity
//! tracking means one identity's traffic can never lock out another's.
//!
//! `accept` is a cheap pre-check run before signature verification so
//! stale requests don't cost a verify. `commit` is the authoritative
//! atomic check-and-set, run only after the signature has verified:
//! an unauthenticated party must not be able to consume timestamps on
//! someone else's behalf. Once a request's signature has verified, its
//! timestamp stays consumed even if a later stage fails.

use crate::error::DirectoryError;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use lighthouse_protocol::NodeId;

/// Tracks the highest committed timestamp per identity.
#[derive(Debug)]
pub struct ReplayGuard {
    last_committed: DashMap<NodeId, u64>,
    max_skew_secs: u64,
}

impl ReplayGuard {
    /// Create a guard. `max_skew_secs` bounds how far a timestamp may
    /// drift from server wall-clock time; 0 disables the freshness check.
    pub fn new(max_skew_secs: u64) -> Self {
        Self {
            last_committed: DashMap::new(),
            max_skew_secs,
        }
    }

    /// Pre-check a timestamp without consuming it.
    pub fn accept(&self, id: &NodeId, timestamp: u64) -> Result<(), DirectoryError> {
        if self.max_skew_secs > 0 {
            let now = Utc::now().timestamp().max(0) as u64;
            if timestamp.abs_diff(now) > self.max_skew_secs {
                return Err(DirectoryError::StaleTimestamp);
            }
        }

        match self.last_committed.get(id) {
            Some(last) if timestamp <= *last => Err(DirectoryError::StaleTimestamp),
            _ => Ok(()),
        }
    }

    /// Consume a timestamp. Atomic per identity: of two concurrent commits
    /// with the same timestamp, exactly one succeeds.
    pub fn commit(&self, id: &NodeId, timestamp: u64) -> Result<(), DirectoryError> {
        match self.last_committed.entry(*id) {
            Entry::Occupied(mut entry) => {
                if timestamp <= *entry.get() {
                    return Err(DirectoryError::StaleTimestamp);
                }
                entry.insert(timestamp);
                Ok(())
            }
            Entry::Vacant(entry) => {
                entry.insert(timestamp);
                Ok(())
            }
        }
    }

    /// Forget all committed timestamps. Called on wipe.
    pub fn clear(&self) {
        self.last_committed.clear();
    }
}
