use axum::{Json, extract::State, http::StatusCode};

use ledger::{LedgerDocument, SyncOutcome, load_ledger};

use crate::state::SharedState;

/// `POST /sync`
///
/// Compares a peer's `{"chain": [...]}` document with the local ledger and
/// reports the blocks to append, or the point where the histories fork.
/// Nothing is written to the local ledger.
pub async fn sync(
    State(state): State<SharedState>,
    Json(document): Json<LedgerDocument>,
) -> Result<Json<SyncOutcome>, (StatusCode, String)> {
    let remote = load_ledger(document).map_err(|e| {
        tracing::warn!("rejecting remote ledger: {e}");
        (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })?;

    let outcome = state.service.reconcile(&remote);
    tracing::info!(
        remote_len = remote.len(),
        fork = outcome.is_fork(),
        missing = outcome.blocks().len(),
        "compared remote ledger"
    );
    Ok(Json(outcome))
}
