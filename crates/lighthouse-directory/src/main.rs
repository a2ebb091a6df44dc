//! Lighthouse directory service - entry point.

use lighthouse_directory::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    config::Config,
    directory::Directory,
    registry::MemoryStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting lighthouse directory");

    if config.admin.wipe_enabled {
        warn!("Wipe endpoint is enabled; do not run this configuration in production");
    }

    // In-memory store; the facade only sees the DirectoryStore trait, so a
    // durable backend slots in here without touching the engine.
    let store = Arc::new(MemoryStore::new());

    let directory = Directory::new(store, config.policy());
    let state = AppState::new(directory);

    let rate_limit = RateLimitState::new(config.rate_limit.global_per_minute);
    let app = create_router_with_rate_limit(state, rate_limit);

    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
