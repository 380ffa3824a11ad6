// api-gateway/src/main.rs

//! API gateway binary.
//!
//! This binary exposes a small HTTP API on top of the `ledger` crate:
//!
//! - `GET /health`
//! - `GET /accounts/{player}`
//! - `GET /escrows/{server}/{event}`
//! - `POST /settlements`
//! - `GET /servers/{server}/payouts`
//! - `POST /sync`
//! - `GET /metrics`
//!
//! It embeds a `DefaultLedgerService` reading the persisted JSON ledger on
//! every request. Settlement state (already-settled escrow blocks) lives for
//! the lifetime of the process.

mod config;
mod routes;
mod state;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use config::ApiConfig;
use ledger::{JsonFileLedger, LedgerConfig, LedgerService, MetricsRegistry};
use routes::{accounts, escrows, health, metrics, payouts, settlements, sync};
use state::{AppState, SharedState, load_names};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("api_gateway=info,ledger=info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let api_cfg = ApiConfig::from_env()?;
    let ledger_cfg = LedgerConfig::from_env();

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new()
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    // ---------------------------
    // Ledger service
    // ---------------------------

    let source = JsonFileLedger::new(&ledger_cfg.ledger_path);
    if !source.path().exists() {
        // Queries still answer with defaults until the node writes the file.
        tracing::warn!(
            "ledger file {} does not exist yet",
            source.path().display()
        );
    }
    let service = LedgerService::new(source, &ledger_cfg, metrics.clone());

    let names = match &api_cfg.names_path {
        Some(path) => {
            let names = load_names(path)?;
            tracing::info!("loaded {} player names from {}", names.len(), path.display());
            names
        }
        None => HashMap::new(),
    };

    // ---------------------------
    // Shared state
    // ---------------------------

    let app_state: SharedState = Arc::new(AppState {
        service,
        names,
        metrics,
        metrics_enabled: ledger_cfg.metrics_enabled,
    });

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/accounts/{player}", get(accounts::account))
        .route("/escrows/{server}/{event}", get(escrows::escrow_status))
        .route("/settlements", post(settlements::settle))
        .route("/servers/{server}/payouts", get(payouts::payout_history))
        .route("/sync", post(sync::sync))
        .route("/metrics", get(metrics::metrics))
        .with_state(app_state);

    // ---------------------------
    // axum 0.8 server (hyper 1 / tokio 1.48 style)
    // ---------------------------

    tracing::info!(
        ledger = %ledger_cfg.ledger_path.display(),
        escrow_timeout_ms = ledger_cfg.escrow_timeout_ms,
        "API gateway listening on http://{}",
        api_cfg.listen_addr
    );

    let listener = tokio::net::TcpListener::bind(api_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", api_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("API server error: {e}"))?;

    Ok(())
}

/// Returns the current wall-clock time as milliseconds since Unix epoch,
/// the unit used by ledger block timestamps.
pub(crate) fn current_unix_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
