//! Shared application state and the player address book.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use ledger::{DefaultLedgerService, MetricsRegistry, PlayerId};

/// Shared state held by the API handlers.
///
/// This is wrapped in an [`Arc`] and passed to request handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Ledger queries and settlement over the persisted JSON document.
    pub service: DefaultLedgerService,
    /// Player address to display name.
    pub names: HashMap<PlayerId, String>,
    /// Metrics registry shared between the ledger service and the API.
    pub metrics: Arc<MetricsRegistry>,
    pub metrics_enabled: bool,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;

/// Reads the `{"<address>": "<name>", ...}` address book.
pub fn load_names(path: &Path) -> Result<HashMap<PlayerId, String>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read names file {}: {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("failed to parse names file {}: {e}", path.display()))
}
