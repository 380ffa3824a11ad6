use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use ledger::{AccountEntry, PlayerId};

use crate::state::SharedState;

/// Response body for `GET /accounts/{player}`.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub player: PlayerId,
    pub coinbase: f64,
    pub wins: f64,
    pub losses: f64,
    pub balance: f64,
    pub history: Vec<AccountEntry>,
}

/// `GET /accounts/{player}`
///
/// Totals and movements of one player. Unknown players and an unavailable
/// ledger both report zero balances.
pub async fn account(
    State(state): State<SharedState>,
    Path(player): Path<String>,
) -> Json<AccountResponse> {
    let player = PlayerId::new(player);
    let service = &state.service;
    let statement = service.statement(&player);

    Json(AccountResponse {
        coinbase: service.coinbase_total(&player),
        wins: service.win_total(&player),
        losses: service.loss_total(&player),
        balance: statement.balance,
        history: statement.history,
        player,
    })
}
