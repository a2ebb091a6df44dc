//! Lighthouse directory HTTP client.

use crate::error::ClientError;
use chrono::Utc;
use lighthouse_protocol::{
    listconns_message, register_message, Keypair, ListConnsResponse, LookupPayload, LookupResponse,
    NodeId, RegisterPayload, RegisterResponse, WipeResponse,
};
use reqwest::{Client, Response, StatusCode};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, instrument};

/// Header carrying the admin token for wipe.
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Client for a lighthouse directory service.
#[derive(Clone)]
pub struct LighthouseClient {
    client: Client,
    base_url: String,
}

impl LighthouseClient {
    /// Create a new client.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Check if the directory is healthy.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Register `endpoint` under the keypair's identity.
    #[instrument(skip(self, keypair))]
    pub async fn register(
        &self,
        keypair: &Keypair,
        endpoint: SocketAddr,
    ) -> Result<RegisterResponse, ClientError> {
        let timestamp = Utc::now().timestamp().max(0) as u64;
        let pubkey = keypair.public_key_base64();
        let signature = hex::encode(keypair.sign(&register_message(&endpoint, &pubkey, timestamp)));

        let payload = RegisterPayload {
            endpoint,
            pubkey,
            signature,
            timestamp,
        };

        let response = self
            .client
            .post(format!("{}/register", self.base_url))
            .json(&payload)
            .send()
            .await?;
        let response = check(response).await?;

        let registered: RegisterResponse = response.json().await?;
        debug!(id = %registered.id, "Registered with directory");
        Ok(registered)
    }

    /// Resolve an identity to its registered endpoint. `client_endpoint` is
    /// this node's own address, recorded by the directory for the identity
    /// owner's listconns.
    #[instrument(skip(self))]
    pub async fn lookup(
        &self,
        id: NodeId,
        client_endpoint: SocketAddr,
    ) -> Result<LookupResponse, ClientError> {
        let payload = LookupPayload {
            id,
            client: client_endpoint,
            timestamp: Utc::now().timestamp().max(0) as u64,
        };

        let response = self
            .client
            .post(format!("{}/lookup", self.base_url))
            .json(&payload)
            .send()
            .await?;
        let response = check(response).await?;

        let resolved: LookupResponse = response.json().await?;
        debug!(id = %id, endpoint = %resolved.endpoint, "Resolved endpoint");
        Ok(resolved)
    }

    /// List the clients that have looked up this keypair's identity.
    #[instrument(skip(self, keypair))]
    pub async fn listconns(&self, keypair: &Keypair) -> Result<ListConnsResponse, ClientError> {
        let id = keypair.node_id();
        let timestamp = Utc::now().timestamp().max(0) as u64;
        let signature = hex::encode(keypair.sign(&listconns_message(&id, timestamp)));

        let payload = lighthouse_protocol::ListConnsPayload {
            id,
            signature,
            timestamp,
        };

        let response = self
            .client
            .post(format!("{}/listconns", self.base_url))
            .json(&payload)
            .send()
            .await?;
        let response = check(response).await?;

        Ok(response.json().await?)
    }

    /// Reset all directory state. Only succeeds against deployments that
    /// have the wipe endpoint enabled; pass the admin token if one is
    /// configured.
    #[instrument(skip(self, admin_token))]
    pub async fn wipe(&self, admin_token: Option<&str>) -> Result<WipeResponse, ClientError> {
        let mut request = self.client.get(format!("{}/wipe", self.base_url));
        if let Some(token) = admin_token {
            request = request.header(ADMIN_TOKEN_HEADER, token);
        }

        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }
}

/// Map non-success statuses onto client errors.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let msg = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => Err(ClientError::NotFound),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            Err(ClientError::Rejected(msg))
        }
        _ => Err(ClientError::Api(msg)),
    }
}
