//! # agora-server
//!
//! HTTP backend of the Agora social platform.
//!
//! This binary provides:
//! - **Mutation pipeline** running per-entity before/after rules around every
//!   create (validation, argument rewriting, response reshaping)
//! - **Fan-out queue** executing best-effort side effects (notifications,
//!   metrics, activity logs) off the request path
//! - **Read guard** redacting soft-deleted content and hiding blocked users
//! - **REST API** (axum) over a SQLite document store

mod api;
mod config;
mod error;
mod fanout;
mod pipeline;
mod services;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use agora_store::{Database, Store};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::fanout::FanOut;
use crate::services::RpcCurrencyVerifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agora_server=debug")),
        )
        .init();

    info!("Starting Agora server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let db = Database::open_at(&config.database_path)?;
    info!(path = %config.database_path.display(), "Database opened");
    let store = Store::new(db);

    let verifier = Arc::new(RpcCurrencyVerifier::new(config.rpc_timeout)?);
    let fanout = FanOut::spawn(config.fanout_concurrency, config.fanout_queue);

    let app_state = AppState::new(store, verifier, fanout.clone());

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!(pending = fanout.pending(), "Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
