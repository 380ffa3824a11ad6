//! High-level ledger service.
//!
//! The service wires together:
//!
//! - a [`LedgerSource`] providing a fresh snapshot per call,
//! - a [`PayoutCalculator`] owning the settled-escrow set,
//! - the [`MetricsRegistry`] and the configured escrow timeout.
//!
//! Every query loads its own snapshot. When the snapshot cannot be loaded
//! the failure is logged and counted, and the query returns its default
//! (`0.0`, `false`, `None` or an empty list/outcome). Callers cannot tell an
//! unavailable ledger from an empty one.

use std::sync::Arc;

use crate::account::{AccountAggregator, Statement};
use crate::config::LedgerConfig;
use crate::escrow::EscrowTracker;
use crate::history::{NameResolver, PayoutRecord, payout_history};
use crate::metrics::MetricsRegistry;
use crate::payout::{PayoutCalculator, PayoutTransaction, SettledEscrowSet, SettledEscrows};
use crate::storage::LedgerSource;
use crate::sync::{self, SyncOutcome};
use crate::types::{Block, BlockHash, PlayerId};
use crate::view::Ledger;

/// Counts successful admissions into the wrapped settled-escrow set.
struct CountedSettled<D> {
    inner: D,
    admitted: prometheus::IntCounter,
}

impl<D: SettledEscrows> SettledEscrows for CountedSettled<D> {
    fn admit(&self, hash: &BlockHash) -> bool {
        let fresh = self.inner.admit(hash);
        if fresh {
            self.admitted.inc();
        }
        fresh
    }

    fn contains(&self, hash: &BlockHash) -> bool {
        self.inner.contains(hash)
    }
}

/// Ledger query and settlement facade.
///
/// This struct is generic over:
///
/// - `S`: snapshot provider implementing [`LedgerSource`],
/// - `D`: settled-escrow set implementing [`SettledEscrows`].
pub struct LedgerService<S, D = SettledEscrowSet> {
    source: S,
    payouts: PayoutCalculator<CountedSettled<D>>,
    metrics: Arc<MetricsRegistry>,
    escrow_timeout_ms: u64,
}

impl<S: LedgerSource> LedgerService<S> {
    /// Creates a service with a fresh, process-lifetime settled-escrow set.
    pub fn new(source: S, config: &LedgerConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self::with_settled(source, config, metrics, SettledEscrowSet::new())
    }
}

impl<S, D> LedgerService<S, D>
where
    S: LedgerSource,
    D: SettledEscrows,
{
    /// Creates a service using an externally owned settled-escrow set.
    pub fn with_settled(
        source: S,
        config: &LedgerConfig,
        metrics: Arc<MetricsRegistry>,
        settled: D,
    ) -> Self {
        let settled = CountedSettled {
            inner: settled,
            admitted: metrics.ledger.escrows_admitted_total.clone(),
        };
        Self {
            source,
            payouts: PayoutCalculator::new(settled),
            metrics,
            escrow_timeout_ms: config.escrow_timeout_ms,
        }
    }

    /// Returns a reference to the underlying ledger source.
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn settled(&self) -> &D {
        &self.payouts.settled().inner
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Loads a snapshot, or logs why none is available.
    fn snapshot(&self, op: &'static str) -> Option<Ledger> {
        let timer = self.metrics.ledger.load_seconds.start_timer();
        let result = self.source.load();
        timer.observe_duration();

        match result {
            Ok(ledger) => Some(ledger),
            Err(e) => {
                self.metrics.ledger.load_failures_total.inc();
                tracing::warn!(op, error = %e, "ledger unavailable, returning default");
                None
            }
        }
    }

    fn query<T, F>(&self, op: &'static str, f: F) -> T
    where
        T: Default,
        F: FnOnce(&Ledger) -> T,
    {
        self.snapshot(op).map(|ledger| f(&ledger)).unwrap_or_default()
    }

    pub fn coinbase_total(&self, player: &PlayerId) -> f64 {
        self.query("coinbase_total", |l| {
            AccountAggregator::new(l).coinbase_total(player)
        })
    }

    pub fn win_total(&self, player: &PlayerId) -> f64 {
        self.query("win_total", |l| AccountAggregator::new(l).win_total(player))
    }

    pub fn loss_total(&self, player: &PlayerId) -> f64 {
        self.query("loss_total", |l| AccountAggregator::new(l).loss_total(player))
    }

    pub fn statement(&self, player: &PlayerId) -> Statement {
        self.query("statement", |l| AccountAggregator::new(l).statement(player))
    }

    pub fn has_coinbase(&self, server: &str, players: &[PlayerId]) -> bool {
        self.query("has_coinbase", |l| {
            AccountAggregator::new(l).has_coinbase(server, players)
        })
    }

    pub fn has_outstanding_escrow(&self, server: &str, event: &str) -> bool {
        self.query("has_outstanding_escrow", |l| {
            EscrowTracker::new(l).has_outstanding_escrow(server, event)
        })
    }

    /// Returns `true` if more than the configured escrow timeout has passed
    /// since the latest escrow of `(server, event)`.
    pub fn elapsed_since_escrow(&self, server: &str, event: &str, now_ms: u64) -> bool {
        let threshold = self.escrow_timeout_ms;
        self.query("elapsed_since_escrow", |l| {
            EscrowTracker::new(l).elapsed_since_escrow(server, event, now_ms, threshold)
        })
    }

    /// Computes one payout per outstanding escrow group of
    /// `(event, match_id)` won by `team`.
    pub fn settle_all(&self, event: &str, team: &str, match_id: &str) -> Vec<PayoutTransaction> {
        let payouts = self.query("settle_all", |l| {
            self.payouts.settle_all(l, event, team, match_id)
        });
        self.record_settlement(event, match_id, &payouts);
        payouts
    }

    /// Computes the payout of the last outstanding escrow group only.
    ///
    /// See [`PayoutCalculator::settle`].
    pub fn settle(&self, event: &str, team: &str, match_id: &str) -> Option<PayoutTransaction> {
        let payout = self.query("settle", |l| self.payouts.settle(l, event, team, match_id));
        if let Some(p) = &payout {
            self.record_settlement(event, match_id, std::slice::from_ref(p));
        }
        payout
    }

    fn record_settlement(&self, event: &str, match_id: &str, payouts: &[PayoutTransaction]) {
        if payouts.is_empty() {
            tracing::debug!(event, match_id, "no outstanding escrow to settle");
            return;
        }
        self.metrics.ledger.settlements_total.inc_by(payouts.len() as u64);
        for payout in payouts {
            tracing::info!(
                event,
                match_id,
                server = %payout.server,
                entries = payout.len(),
                total = payout.total(),
                "settled escrow group"
            );
        }
    }

    pub fn payout_history<R>(&self, server: &str, names: &R) -> Vec<PayoutRecord>
    where
        R: NameResolver + ?Sized,
    {
        self.query("payout_history", |l| payout_history(l, server, names))
    }

    /// Remote blocks missing from the local ledger (legacy diff).
    ///
    /// An unavailable local ledger yields an empty list.
    pub fn missing_blocks(&self, remote: &Ledger) -> Vec<Block> {
        let blocks = self.query("missing_blocks", |local| sync::diff(local, remote));
        self.metrics
            .ledger
            .sync_missing_blocks_total
            .inc_by(blocks.len() as u64);
        blocks
    }

    /// Fork-aware comparison of the local ledger with `remote`.
    ///
    /// An unavailable local ledger yields an empty [`SyncOutcome::Append`].
    pub fn reconcile(&self, remote: &Ledger) -> SyncOutcome {
        let outcome = self.query("reconcile", |local| sync::reconcile(local, remote));
        self.metrics
            .ledger
            .sync_missing_blocks_total
            .inc_by(outcome.blocks().len() as u64);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryLedger, JsonFileLedger};
    use crate::view::tests::{coinbase, dummy_ledger, escrow, transfer};
    use tempfile::TempDir;

    fn metrics() -> Arc<MetricsRegistry> {
        Arc::new(MetricsRegistry::new().expect("metrics registry"))
    }

    fn service_over(ledger: Ledger) -> LedgerService<InMemoryLedger> {
        LedgerService::new(InMemoryLedger::new(ledger), &LedgerConfig::default(), metrics())
    }

    fn unavailable() -> (TempDir, LedgerService<JsonFileLedger>) {
        let tmp = TempDir::new().expect("create temp dir");
        let source = JsonFileLedger::new(tmp.path().join("missing.json"));
        let service = LedgerService::new(source, &LedgerConfig::default(), metrics());
        (tmp, service)
    }

    fn sample() -> Ledger {
        dummy_ledger(vec![
            coinbase("s1", &["A", "B", "C"], &[100.0, 100.0, 100.0]),
            escrow("s1", "e1", "m1", &["A", "B", "C"], &["X", "Y", "X"], &[10.0, 10.0, 10.0]),
        ])
    }

    #[test]
    fn queries_read_through_source() {
        let service = service_over(sample());
        let a = PlayerId::new("A");

        assert_eq!(service.coinbase_total(&a), 100.0);
        assert_eq!(service.loss_total(&a), 10.0);
        assert_eq!(service.win_total(&a), 0.0);
        assert_eq!(service.statement(&a).balance, 90.0);
        assert!(service.has_coinbase("s1", &[a]));
        assert!(service.has_outstanding_escrow("s1", "e1"));
    }

    #[test]
    fn unavailable_ledger_returns_defaults() {
        let (_tmp, service) = unavailable();
        let a = PlayerId::new("A");

        assert_eq!(service.coinbase_total(&a), 0.0);
        assert_eq!(service.win_total(&a), 0.0);
        assert_eq!(service.loss_total(&a), 0.0);
        assert_eq!(service.statement(&a), Statement::default());
        assert!(!service.has_coinbase("s1", &[a]));
        assert!(!service.has_outstanding_escrow("s1", "e1"));
        assert!(!service.elapsed_since_escrow("s1", "e1", u64::MAX));
        assert!(service.settle("e1", "X", "m1").is_none());
        assert!(service.settle_all("e1", "X", "m1").is_empty());
        assert!(service.payout_history("s1", &crate::history::RawAddresses).is_empty());
        assert!(service.missing_blocks(&sample()).is_empty());
        assert!(service.reconcile(&sample()).is_up_to_date());

        assert_eq!(service.metrics().ledger.load_failures_total.get(), 12);
    }

    #[test]
    fn settlement_is_recorded_once() {
        let service = service_over(sample());

        let payout = service.settle("e1", "X", "m1").expect("payout");
        assert_eq!(payout.len(), 4);
        assert!(service.settled().contains(&BlockHash::new("h2")));
        assert!(service.settle("e1", "X", "m1").is_none());

        assert_eq!(service.metrics().ledger.settlements_total.get(), 1);
        assert_eq!(service.metrics().ledger.escrows_admitted_total.get(), 1);
    }

    #[test]
    fn injected_set_is_shared_between_services() {
        let shared = Arc::new(SettledEscrowSet::new());
        let cfg = LedgerConfig::default();
        let first = LedgerService::with_settled(
            InMemoryLedger::new(sample()),
            &cfg,
            metrics(),
            shared.clone(),
        );
        let second =
            LedgerService::with_settled(InMemoryLedger::new(sample()), &cfg, metrics(), shared);

        assert_eq!(first.settle_all("e1", "X", "m1").len(), 1);
        assert!(second.settle_all("e1", "X", "m1").is_empty());
    }

    #[test]
    fn elapsed_uses_configured_timeout() {
        let cfg = LedgerConfig {
            escrow_timeout_ms: 5_000,
            ..LedgerConfig::default()
        };
        let service = LedgerService::new(InMemoryLedger::new(sample()), &cfg, metrics());
        // Escrow is block 2 of dummy_ledger.
        let at = 1_700_000_002_000;

        assert!(!service.elapsed_since_escrow("s1", "e1", at + 5_000));
        assert!(service.elapsed_since_escrow("s1", "e1", at + 5_001));
    }

    #[test]
    fn sync_against_longer_remote() {
        let service = service_over(sample());
        let mut remote = sample();
        remote.extend(
            dummy_ledger(vec![
                coinbase("s1", &["A", "B", "C"], &[100.0, 100.0, 100.0]),
                escrow("s1", "e1", "m1", &["A", "B", "C"], &["X", "Y", "X"], &[10.0, 10.0, 10.0]),
                transfer("s1", "e1", "m1", &["A"], &["A"], &[10.0]),
            ])
            .blocks()[3..]
                .iter()
                .cloned(),
        );

        let missing = service.missing_blocks(&remote);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].hash, BlockHash::new("h3"));

        let outcome = service.reconcile(&remote);
        assert!(!outcome.is_fork());
        assert_eq!(outcome.blocks().len(), 1);
        assert_eq!(service.metrics().ledger.sync_missing_blocks_total.get(), 2);
    }
}
