//! Prometheus-backed metrics registry.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};

/// Ledger-related Prometheus metrics.
///
/// These are registered into a [`Registry`] and updated by
/// [`crate::service::LedgerService`].
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Time to load a ledger snapshot, in seconds.
    pub load_seconds: Histogram,
    /// Number of snapshot loads that failed and fell back to defaults.
    pub load_failures_total: IntCounter,
    /// Number of payout transactions produced by settlement.
    pub settlements_total: IntCounter,
    /// Number of escrow blocks admitted into a settlement run.
    pub escrows_admitted_total: IntCounter,
    /// Number of remote blocks reported missing by reconciliation.
    pub sync_missing_blocks_total: IntCounter,
}

impl LedgerMetrics {
    /// Registers ledger metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let load_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_load_seconds",
                "Time to load and validate a ledger snapshot in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
        )?;
        registry.register(Box::new(load_seconds.clone()))?;

        let load_failures_total = IntCounter::with_opts(Opts::new(
            "ledger_load_failures_total",
            "Total number of ledger loads that failed and returned a default",
        ))?;
        registry.register(Box::new(load_failures_total.clone()))?;

        let settlements_total = IntCounter::with_opts(Opts::new(
            "ledger_settlements_total",
            "Total number of payout transactions computed",
        ))?;
        registry.register(Box::new(settlements_total.clone()))?;

        let escrows_admitted_total = IntCounter::with_opts(Opts::new(
            "ledger_escrows_admitted_total",
            "Total number of escrow blocks admitted into settlement",
        ))?;
        registry.register(Box::new(escrows_admitted_total.clone()))?;

        let sync_missing_blocks_total = IntCounter::with_opts(Opts::new(
            "ledger_sync_missing_blocks_total",
            "Total number of remote blocks found missing locally",
        ))?;
        registry.register(Box::new(sync_missing_blocks_total.clone()))?;

        Ok(Self {
            load_seconds,
            load_failures_total,
            settlements_total,
            escrows_admitted_total,
            sync_missing_blocks_total,
        })
    }
}

/// Wrapper around a Prometheus registry and the ledger metrics.
///
/// This is the main handle you pass around. It can be wrapped in an
/// [`std::sync::Arc`] and shared across threads/tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub ledger: LedgerMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the ledger metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("wager".to_string()), None)?;
        let ledger = LedgerMetrics::register(&registry)?;
        Ok(Self { registry, ledger })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("failed to encode Prometheus metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_metrics_register_and_record() {
        let registry = Registry::new();
        let metrics = LedgerMetrics::register(&registry).expect("register metrics");

        metrics.load_seconds.observe(0.002);
        metrics.load_failures_total.inc();
        metrics.settlements_total.inc_by(3);
        metrics.escrows_admitted_total.inc();
        metrics.sync_missing_blocks_total.inc_by(2);

        let metric_families = registry.gather();
        assert_eq!(metric_families.len(), 5);
    }

    #[test]
    fn metrics_registry_gather_text_works() {
        let registry = MetricsRegistry::new().expect("create metrics registry");
        registry.ledger.settlements_total.inc();
        let text = registry.gather_text();
        assert!(text.contains("wager_ledger_settlements_total"));
    }
}
