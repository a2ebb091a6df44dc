//! HTTP request handlers.
//!
//! Thin adapters between the wire types and the directory facade; all
//! authorization and validation decisions live in the facade.

use super::AppState;
use crate::error::DirectoryError;
use axum::{extract::State, http::HeaderMap, Json};
use lighthouse_protocol::{
    HealthResponse, ListConnsPayload, ListConnsResponse, LookupPayload, LookupResponse, PeerEntry,
    RegisterPayload, RegisterResponse, WipeResponse,
};

/// Header carrying the admin token for wipe.
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, DirectoryError> {
    let registrations = state.directory.registration_count().await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        registrations,
    }))
}

/// Register an endpoint under the signing key's identity.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<RegisterResponse>, DirectoryError> {
    let record = state.directory.register(&payload).await?;

    Ok(Json(RegisterResponse {
        id: record.id,
        endpoint: record.endpoint,
        registered_at: record.registered_at.to_rfc3339(),
    }))
}

/// Resolve an identity to its registered endpoint.
pub async fn lookup(
    State(state): State<AppState>,
    Json(payload): Json<LookupPayload>,
) -> Result<Json<LookupResponse>, DirectoryError> {
    let record = state.directory.lookup(&payload).await?;

    Ok(Json(LookupResponse {
        id: record.id,
        endpoint: record.endpoint,
    }))
}

/// List the clients that have looked up the caller's identity.
pub async fn listconns(
    State(state): State<AppState>,
    Json(payload): Json<ListConnsPayload>,
) -> Result<Json<ListConnsResponse>, DirectoryError> {
    let history = state.directory.listconns(&payload).await?;

    let peers: Vec<PeerEntry> = history
        .into_iter()
        .map(|r| PeerEntry {
            client: r.client,
            looked_up_at: r.looked_up_at.to_rfc3339(),
        })
        .collect();

    let total = peers.len();
    Ok(Json(ListConnsResponse { peers, total }))
}

/// Reset all directory state. Gated by deployment policy.
pub async fn wipe(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<WipeResponse>, DirectoryError> {
    let token = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    let registrations_removed = state.directory.wipe(token).await?;

    Ok(Json(WipeResponse {
        status: "wiped".to_string(),
        registrations_removed,
    }))
}
