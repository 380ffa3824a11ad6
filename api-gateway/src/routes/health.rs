use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use ledger::LedgerSource;

use crate::state::SharedState;

/// Health-check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Number of blocks in the local ledger, genesis included.
    pub blocks: Option<usize>,
}

/// `GET /health`
///
/// Liveness plus a ledger probe. The gateway stays up when the ledger file
/// is missing, so this reports `degraded` rather than failing.
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    match state.service.source().load() {
        Ok(ledger) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                blocks: Some(ledger.len()),
            }),
        ),
        Err(e) => {
            tracing::warn!("health probe could not load ledger: {e}");
            (
                StatusCode::OK,
                Json(HealthResponse {
                    status: "degraded",
                    blocks: None,
                }),
            )
        }
    }
}
