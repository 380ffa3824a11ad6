//! Top-level configuration for the ledger.
//!
//! This module aggregates:
//!
//! - the location of the persisted ledger document,
//! - the escrow timeout used by [`crate::service::LedgerService::elapsed_since_escrow`],
//! - whether metrics are collected and exposed.
//!
//! [`LedgerConfig::default`] gives a working local setup;
//! [`LedgerConfig::from_env`] overlays environment variables on top.

use std::env;
use std::path::PathBuf;

/// Environment variable naming the ledger JSON file.
pub const ENV_LEDGER_FILE: &str = "LEDGER_FILE";
/// Environment variable holding the escrow timeout in milliseconds.
pub const ENV_ESCROW_TIMEOUT_MS: &str = "LEDGER_ESCROW_TIMEOUT_MS";
/// Environment variable toggling metrics (`true`/`false`, `1`/`0`).
pub const ENV_METRICS: &str = "LEDGER_METRICS";

/// Top-level ledger configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Path of the persisted `{"chain": [...]}` document.
    pub ledger_path: PathBuf,
    /// Time after the latest escrow of an event past which the escrow is
    /// considered stale, in milliseconds.
    pub escrow_timeout_ms: u64,
    /// Whether to expose a `/metrics` endpoint.
    pub metrics_enabled: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("data/blockchain.json"),
            escrow_timeout_ms: 120_000,
            metrics_enabled: true,
        }
    }
}

impl LedgerConfig {
    /// Builds a configuration from defaults overridden by environment
    /// variables. Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from `lookup` (an environment-like key/value source).
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_LEDGER_FILE) {
            self.ledger_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_ESCROW_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.escrow_timeout_ms = ms,
                Err(e) => tracing::warn!(
                    key = ENV_ESCROW_TIMEOUT_MS,
                    value = %raw,
                    "ignoring invalid escrow timeout: {e}"
                ),
            }
        }

        if let Some(raw) = lookup(ENV_METRICS) {
            match parse_flag(&raw) {
                Some(enabled) => self.metrics_enabled = enabled,
                None => tracing::warn!(key = ENV_METRICS, value = %raw, "ignoring invalid flag"),
            }
        }

        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_two_minutes_and_local_file() {
        let cfg = LedgerConfig::default();
        assert_eq!(cfg.escrow_timeout_ms, 120_000);
        assert_eq!(cfg.ledger_path, PathBuf::from("data/blockchain.json"));
        assert!(cfg.metrics_enabled);
    }

    #[test]
    fn overrides_replace_defaults() {
        let cfg = LedgerConfig::default().with_overrides(lookup(&[
            (ENV_LEDGER_FILE, "/var/lib/wager/chain.json"),
            (ENV_ESCROW_TIMEOUT_MS, "30000"),
            (ENV_METRICS, "off"),
        ]));

        assert_eq!(cfg.ledger_path, PathBuf::from("/var/lib/wager/chain.json"));
        assert_eq!(cfg.escrow_timeout_ms, 30_000);
        assert!(!cfg.metrics_enabled);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let cfg = LedgerConfig::default().with_overrides(lookup(&[
            (ENV_ESCROW_TIMEOUT_MS, "two minutes"),
            (ENV_METRICS, "maybe"),
        ]));

        assert_eq!(cfg, LedgerConfig::default());
    }
}
