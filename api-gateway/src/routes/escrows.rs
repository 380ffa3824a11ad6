use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::state::SharedState;

/// Response body for `GET /escrows/{server}/{event}`.
#[derive(Debug, Serialize)]
pub struct EscrowStatusResponse {
    pub server: String,
    pub event: String,
    /// Some match of the event still has an unsettled escrow.
    pub outstanding: bool,
    /// The latest escrow is older than the configured timeout.
    pub elapsed: bool,
}

/// `GET /escrows/{server}/{event}`
pub async fn escrow_status(
    State(state): State<SharedState>,
    Path((server, event)): Path<(String, String)>,
) -> Json<EscrowStatusResponse> {
    let now = crate::current_unix_millis();
    let outstanding = state.service.has_outstanding_escrow(&server, &event);
    let elapsed = state.service.elapsed_since_escrow(&server, &event, now);

    Json(EscrowStatusResponse {
        server,
        event,
        outstanding,
        elapsed,
    })
}
