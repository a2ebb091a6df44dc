//! The directory facade: orchestrates validation, replay protection,
//! signature verification, and storage for the four operations.

use crate::error::DirectoryError;
use crate::registry::{DirectoryStore, LookupRecord, RegistrationRecord, StoreError};
use crate::replay::ReplayGuard;
use chrono::Utc;
use lighthouse_protocol::{
    decode_public_key, decode_signature, derive_id, verify, ListConnsPayload, LookupPayload,
    RegisterPayload,
};
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Operational policy for a directory instance.
#[derive(Debug)]
pub struct DirectoryPolicy {
    /// Freshness window for request timestamps in seconds; 0 disables.
    pub max_skew_secs: u64,

    /// Whether `wipe` is available at all. Off by default: a full-registry
    /// reset is a test/bootstrap tool, not a public operation.
    pub wipe_enabled: bool,

    /// Admin token required for `wipe` when set.
    pub wipe_token: Option<SecretString>,

    /// Bound on any single store call.
    pub op_timeout: Duration,

    /// Retries for failed store calls before surfacing `Internal`.
    pub op_retries: u32,
}

impl Default for DirectoryPolicy {
    fn default() -> Self {
        Self {
            max_skew_secs: 300,
            wipe_enabled: false,
            wipe_token: None,
            op_timeout: Duration::from_secs(2),
            op_retries: 2,
        }
    }
}

/// The registration/lookup engine.
///
/// Holds the injected store, the replay guard, and the policy. Cheap to
/// share behind an `Arc`; all methods take `&self`.
pub struct Directory {
    store: Arc<dyn DirectoryStore>,
    replay: ReplayGuard,
    policy: DirectoryPolicy,
}

impl Directory {
    /// Create a directory over the given store.
    pub fn new(store: Arc<dyn DirectoryStore>, policy: DirectoryPolicy) -> Self {
        let replay = ReplayGuard::new(policy.max_skew_secs);
        Self {
            store,
            replay,
            policy,
        }
    }

    /// Register (or re-register) an endpoint under the key that signed the
    /// request. The identity is derived server-side from the public key;
    /// nothing identity-related is trusted from the caller.
    pub async fn register(
        &self,
        payload: &RegisterPayload,
    ) -> Result<RegistrationRecord, DirectoryError> {
        let pubkey = decode_public_key(&payload.pubkey)?;
        let signature = decode_signature(&payload.signature)?;
        let id = derive_id(&pubkey);

        self.replay.accept(&id, payload.timestamp)?;

        if !verify(&pubkey, &signature, &payload.canonical_message()) {
            warn!(id = %id, "Register rejected: signature does not verify");
            return Err(DirectoryError::Unauthorized(
                "signature does not verify against supplied public key".into(),
            ));
        }

        // The signature checked out, so the timestamp is consumed now.
        // Whatever happens in storage, this exact request cannot run twice.
        self.replay.commit(&id, payload.timestamp)?;

        let record = RegistrationRecord {
            id,
            pubkey: payload.pubkey.clone(),
            endpoint: payload.endpoint,
            registered_at: Utc::now(),
        };

        self.with_retry(|| self.store.put_registration(record.clone()))
            .await?;

        info!(id = %id, endpoint = %record.endpoint, "Registered endpoint");
        Ok(record)
    }

    /// Resolve an identity to its registered endpoint, recording the
    /// querying client in the identity's lookup history.
    ///
    /// Unsigned: the payload carries no proof of the client's identity, so
    /// the replay guard is not consulted.
    pub async fn lookup(
        &self,
        payload: &LookupPayload,
    ) -> Result<RegistrationRecord, DirectoryError> {
        let record = self
            .with_retry(|| self.store.get_registration(&payload.id))
            .await?
            .ok_or_else(|| DirectoryError::NotFound(payload.id.to_string()))?;

        let entry = LookupRecord {
            id: payload.id,
            client: payload.client,
            looked_up_at: Utc::now(),
        };
        self.with_retry(|| self.store.append_lookup(entry.clone()))
            .await?;

        info!(id = %payload.id, client = %payload.client, "Resolved endpoint");
        Ok(record)
    }

    /// Return the lookup history for an identity, most recent first.
    /// Requires a signature by the identity's registered key.
    pub async fn listconns(
        &self,
        payload: &ListConnsPayload,
    ) -> Result<Vec<LookupRecord>, DirectoryError> {
        let signature = decode_signature(&payload.signature)?;

        self.replay.accept(&payload.id, payload.timestamp)?;

        let record = self
            .with_retry(|| self.store.get_registration(&payload.id))
            .await?
            .ok_or_else(|| DirectoryError::NotFound(payload.id.to_string()))?;

        // The stored pubkey was validated at registration; failure here
        // means the backing store handed back something we never wrote.
        let pubkey = decode_public_key(&record.pubkey)
            .map_err(|e| DirectoryError::Internal(format!("stored public key corrupt: {}", e)))?;

        if !verify(&pubkey, &signature, &payload.canonical_message()) {
            warn!(id = %payload.id, "Listconns rejected: signature does not verify");
            return Err(DirectoryError::Unauthorized(
                "signature does not verify against registered key".into(),
            ));
        }

        self.replay.commit(&payload.id, payload.timestamp)?;

        let mut history = self
            .with_retry(|| self.store.lookups_for(&payload.id))
            .await?;
        history.reverse();

        info!(id = %payload.id, entries = history.len(), "Served lookup history");
        Ok(history)
    }

    /// Clear all registrations, lookup history, and replay state.
    ///
    /// Gated: refused unless enabled by policy, and when an admin token is
    /// configured the caller must present it.
    pub async fn wipe(&self, token: Option<&str>) -> Result<usize, DirectoryError> {
        if !self.policy.wipe_enabled {
            warn!("Wipe requested but disabled by policy");
            return Err(DirectoryError::Unauthorized(
                "wipe is disabled on this deployment".into(),
            ));
        }

        if let Some(expected) = &self.policy.wipe_token {
            if token != Some(expected.expose_secret().as_str()) {
                warn!("Wipe requested with missing or wrong admin token");
                return Err(DirectoryError::Unauthorized(
                    "missing or invalid admin token".into(),
                ));
            }
        }

        let removed = self.with_retry(|| self.store.wipe()).await?;
        self.replay.clear();

        info!(removed, "Wiped directory");
        Ok(removed)
    }

    /// Number of live registrations, for health reporting.
    pub async fn registration_count(&self) -> Result<usize, DirectoryError> {
        self.with_retry(|| self.store.registration_count()).await
    }

    /// Run a store operation under the configured timeout, retrying
    /// failures a bounded number of times. No partial mutation is
    /// observable after a failed attempt: every store operation is a
    /// single atomic call.
    async fn with_retry<T, F, Fut>(&self, op: F) -> Result<T, DirectoryError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0u32;
        loop {
            match tokio::time::timeout(self.policy.op_timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    if attempt >= self.policy.op_retries {
                        return Err(e.into());
                    }
                    warn!(attempt, error = %e, "Store operation failed, retrying");
                }
                Err(_) => {
                    if attempt >= self.policy.op_retries {
                        return Err(DirectoryError::Internal(
                            "storage operation timed out".into(),
                        ));
                    }
                    warn!(attempt, "Store operation timed out, retrying");
                }
            }
            attempt += 1;
        }
    }
}
