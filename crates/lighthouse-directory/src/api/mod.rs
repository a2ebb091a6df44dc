//! HTTP API for the directory service.

mod handlers;
mod middleware;

pub use middleware::{rate_limit_middleware, RateLimitState};

use crate::directory::Directory;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The registration/lookup engine
    pub directory: Arc<Directory>,
}

impl AppState {
    /// Create new application state.
    pub fn new(directory: Directory) -> Self {
        Self {
            directory: Arc::new(directory),
        }
    }
}

/// Create the API router with default rate limiting.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(60))
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Directory operations
        .route("/register", post(handlers::register))
        .route("/lookup", post(handlers::lookup))
        .route("/listconns", post(handlers::listconns))
        // Administrative reset; the handler enforces the policy gate
        .route("/wipe", get(handlers::wipe))
        .layer(axum_middleware::from_fn_with_state(
            rate_limit.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
