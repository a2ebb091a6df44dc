//! Configuration for the directory service.

use crate::directory::DirectoryPolicy;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Replay protection configuration
    #[serde(default)]
    pub replay: ReplayConfig,

    /// Administrative operations configuration
    #[serde(default)]
    pub admin: AdminConfig,

    /// Storage call bounds
    #[serde(default)]
    pub store: StoreConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayConfig {
    /// Freshness window for request timestamps in seconds; 0 disables.
    #[serde(default = "default_max_skew_secs")]
    pub max_skew_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct AdminConfig {
    /// Whether the wipe endpoint is available. Off unless this deployment
    /// is a test or bootstrap environment.
    #[serde(default)]
    pub wipe_enabled: bool,

    /// Token required in the x-admin-token header for wipe, if set.
    #[serde(default)]
    pub wipe_token: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Bound on any single storage call, in milliseconds.
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,

    /// Retries for failed storage calls.
    #[serde(default = "default_op_retries")]
    pub op_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_skew_secs: default_max_skew_secs(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            wipe_enabled: false,
            wipe_token: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            op_timeout_ms: default_op_timeout_ms(),
            op_retries: default_op_retries(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_max_skew_secs() -> u64 {
    300
}

fn default_op_timeout_ms() -> u64 {
    2000
}

fn default_op_retries() -> u32 {
    2
}

fn default_global_rpm() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// The facade policy this configuration describes.
    pub fn policy(&self) -> DirectoryPolicy {
        DirectoryPolicy {
            max_skew_secs: self.replay.max_skew_secs,
            wipe_enabled: self.admin.wipe_enabled,
            wipe_token: self.admin.wipe_token.clone(),
            op_timeout: Duration::from_millis(self.store.op_timeout_ms),
            op_retries: self.store.op_retries,
        }
    }
}
