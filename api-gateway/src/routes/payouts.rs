use axum::{
    Json,
    extract::{Path, State},
};

use ledger::PayoutRecord;

use crate::state::SharedState;

/// `GET /servers/{server}/payouts`
///
/// Oracle-triggered payouts of `server`, with addresses replaced by the
/// names from the configured address book.
pub async fn payout_history(
    State(state): State<SharedState>,
    Path(server): Path<String>,
) -> Json<Vec<PayoutRecord>> {
    Json(state.service.payout_history(&server, &state.names))
}
