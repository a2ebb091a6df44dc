//! Error types for the directory service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lighthouse_protocol::ProtocolError;
use serde::Serialize;
use thiserror::Error;

/// Directory error taxonomy.
///
/// `InvalidInput` and `Unauthorized` are terminal for the request and never
/// mutate state. `Internal` is surfaced only after the facade has exhausted
/// its storage retries.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("stale or already used timestamp")]
    StaleTimestamp,

    #[error("no registration for identity {0}")]
    NotFound(String),

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            DirectoryError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            DirectoryError::Unauthorized(_) => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
            DirectoryError::StaleTimestamp => (StatusCode::FORBIDDEN, "STALE_TIMESTAMP"),
            DirectoryError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            DirectoryError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
            DirectoryError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ProtocolError> for DirectoryError {
    fn from(e: ProtocolError) -> Self {
        DirectoryError::InvalidInput(e.to_string())
    }
}

impl From<crate::registry::StoreError> for DirectoryError {
    fn from(e: crate::registry::StoreError) -> Self {
        DirectoryError::Internal(e.to_string())
    }
}
