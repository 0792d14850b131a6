//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./agora.db`
    pub database_path: PathBuf,

    /// Side effects allowed to run at the same time.
    /// Env: `FANOUT_CONCURRENCY`
    /// Default: `8`
    pub fanout_concurrency: usize,

    /// Side effects that may wait for a worker before new ones are dropped.
    /// Env: `FANOUT_QUEUE`
    /// Default: `1024`
    pub fanout_queue: usize,

    /// Timeout for outbound JSON-RPC calls to blockchain nodes.
    /// Env: `RPC_TIMEOUT_SECS`
    /// Default: `10`
    pub rpc_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            database_path: PathBuf::from("./agora.db"),
            fanout_concurrency: 8,
            fanout_queue: 1024,
            rpc_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = parsed(&lookup, "HTTP_ADDR") {
            config.http_addr = addr;
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(n) = parsed::<usize>(&lookup, "FANOUT_CONCURRENCY") {
            config.fanout_concurrency = n.max(1);
        }

        if let Some(n) = parsed::<usize>(&lookup, "FANOUT_QUEUE") {
            config.fanout_queue = n.max(1);
        }

        if let Some(secs) = parsed::<u64>(&lookup, "RPC_TIMEOUT_SECS") {
            config.rpc_timeout = Duration::from_secs(secs);
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let value = lookup(key)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "Invalid value, using default");
            None
        }
    }
}
