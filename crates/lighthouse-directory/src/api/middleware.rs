//! Rate limiting middleware.

use crate::error::DirectoryError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc};
use tracing::warn;

/// Global rate limiter (not keyed by client).
type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    global: Arc<GlobalLimiter>,
}

impl RateLimitState {
    /// Create a rate limit state allowing `requests_per_minute` globally.
    pub fn new(requests_per_minute: u32) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::new(60).unwrap()),
        );

        Self {
            global: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// A limiter loose enough to never trip in tests.
    pub fn permissive() -> Self {
        Self::new(10_000)
    }

    /// Check the global limit.
    pub fn check(&self) -> bool {
        self.global.check().is_ok()
    }
}

/// Reject requests over the global rate limit with 429.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, DirectoryError> {
    if !rate_limit.check() {
        warn!("Global rate limit exceeded");
        return Err(DirectoryError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}
