use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use ledger::PayoutTransaction;

use crate::state::SharedState;

/// Request body for `POST /settlements`.
#[derive(Debug, Deserialize)]
pub struct SettlementRequest {
    pub event: String,
    /// Winning outcome, compared against each escrow wager.
    pub team: String,
    #[serde(rename = "match")]
    pub match_id: String,
}

/// `POST /settlements`
///
/// Computes one payout per outstanding escrow group of the match. Escrow
/// blocks returned here are recorded as settled and will not be paid again
/// by this process; the caller is responsible for appending the transfers.
pub async fn settle(
    State(state): State<SharedState>,
    Json(body): Json<SettlementRequest>,
) -> Result<Json<Vec<PayoutTransaction>>, (StatusCode, String)> {
    if body.event.is_empty() || body.match_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "`event` and `match` must be non-empty".to_string(),
        ));
    }

    let payouts = state
        .service
        .settle_all(&body.event, &body.team, &body.match_id);
    Ok(Json(payouts))
}
