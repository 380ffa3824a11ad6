//! Settlement engine: matches escrows to transfers and computes payouts.
//!
//! For a given `(event, match)` the calculator:
//!
//! 1. collects every escrow block not yet admitted by an earlier run,
//!    recording its hash in a [`SettledEscrows`] set,
//! 2. retires collected groups whose `(server, event)` is matched by a later
//!    transfer block,
//! 3. settles each remaining group independently with
//!    [`settle_group`].
//!
//! Settlement is pari-mutuel with a per-winner cap. Winners get their own
//! stake back. Each loser's stake is split equally across the winners, but
//! a winner never receives more than `winner_stake / winner_count` from any
//! single loser. Whatever a loser has left after the split is refunded.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::types::{BlockHash, Payload, PlayerId, TransferPayload};
use crate::view::{Ledger, PayloadFilter};

/// Refunds at or below this amount are treated as rounding residue.
const DUST: f64 = 1e-9;

/// Set of escrow block hashes that were already admitted into a payout.
///
/// Implementations must make [`SettledEscrows::admit`] an atomic
/// check-and-insert so concurrent settlement runs cannot both admit the
/// same escrow block.
pub trait SettledEscrows: Send + Sync {
    /// Records `hash`. Returns `false` if it was already recorded.
    fn admit(&self, hash: &BlockHash) -> bool;

    /// Returns `true` if `hash` was already recorded.
    fn contains(&self, hash: &BlockHash) -> bool;
}

/// In-memory [`SettledEscrows`] with no eviction.
#[derive(Debug, Default)]
pub struct SettledEscrowSet {
    inner: Mutex<HashSet<BlockHash>>,
}

impl SettledEscrowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl SettledEscrows for SettledEscrowSet {
    fn admit(&self, hash: &BlockHash) -> bool {
        self.inner.lock().insert(hash.clone())
    }

    fn contains(&self, hash: &BlockHash) -> bool {
        self.inner.lock().contains(hash)
    }
}

impl<T: SettledEscrows + ?Sized> SettledEscrows for Arc<T> {
    fn admit(&self, hash: &BlockHash) -> bool {
        (**self).admit(hash)
    }

    fn contains(&self, hash: &BlockHash) -> bool {
        (**self).contains(hash)
    }
}

/// Stakes of one escrow block awaiting settlement.
#[derive(Clone, Debug, PartialEq)]
pub struct EscrowGroup {
    /// Hash of the escrow block this group was built from.
    pub hash: BlockHash,
    pub players: Vec<PlayerId>,
    pub wagers: Vec<String>,
    pub amounts: Vec<f64>,
    pub server: String,
    pub event: String,
}

/// Payout computed for one escrow group, to be appended as a transfer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PayoutTransaction {
    pub from: Vec<PlayerId>,
    pub to: Vec<PlayerId>,
    pub amount: Vec<f64>,
    pub event: String,
    pub server: String,
    #[serde(rename = "match")]
    pub match_id: String,
}

impl PayoutTransaction {
    pub fn new(
        event: impl Into<String>,
        server: impl Into<String>,
        match_id: impl Into<String>,
    ) -> Self {
        Self {
            from: Vec::new(),
            to: Vec::new(),
            amount: Vec::new(),
            event: event.into(),
            server: server.into(),
            match_id: match_id.into(),
        }
    }

    fn push(&mut self, from: &PlayerId, to: &PlayerId, amount: f64) {
        self.from.push(from.clone());
        self.to.push(to.clone());
        self.amount.push(amount);
    }

    /// Number of `(from, to, amount)` entries.
    pub fn len(&self) -> usize {
        self.amount.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_empty()
    }

    /// Total amount moved by this payout.
    pub fn total(&self) -> f64 {
        self.amount.iter().sum()
    }

    /// Converts the payout into the transfer payload written to the ledger.
    ///
    /// `oracle` carries the outcome details (`[minute, _, team, ...]`) when
    /// the settlement was triggered by an outcome oracle.
    pub fn into_transfer(self, oracle: Vec<String>) -> TransferPayload {
        TransferPayload {
            from: self.from,
            to: self.to,
            amount: self.amount,
            server: self.server,
            event: self.event,
            match_id: self.match_id,
            oracle,
        }
    }
}

/// Settles a single escrow group for the winning `team`.
pub fn settle_group(group: &EscrowGroup, team: &str, match_id: &str) -> PayoutTransaction {
    let mut payout = PayoutTransaction::new(&group.event, &group.server, match_id);
    let mut winners: Vec<(&PlayerId, f64)> = Vec::new();
    let mut losers: Vec<(&PlayerId, f64)> = Vec::new();

    for ((player, wager), &amount) in group
        .players
        .iter()
        .zip(&group.wagers)
        .zip(&group.amounts)
    {
        if wager == team {
            payout.push(player, player, amount);
            winners.push((player, amount));
        } else {
            losers.push((player, amount));
        }
    }

    let winner_count = winners.len() as f64;
    for (loser, stake) in losers {
        let mut remaining = stake;
        for &(winner, winner_stake) in &winners {
            let share = (stake / winner_count).min(winner_stake / winner_count);
            payout.push(loser, winner, share);
            remaining -= share;
        }
        if remaining > DUST {
            payout.push(loser, loser, remaining);
        }
    }

    payout
}

/// Settlement engine owning the set of already-settled escrow blocks.
#[derive(Debug)]
pub struct PayoutCalculator<D = SettledEscrowSet> {
    settled: D,
}

impl Default for PayoutCalculator {
    fn default() -> Self {
        Self::new(SettledEscrowSet::new())
    }
}

impl<D: SettledEscrows> PayoutCalculator<D> {
    /// Creates a calculator backed by `settled`.
    ///
    /// Pass a shared `Arc` to let several calculators agree on which escrow
    /// blocks are already settled, or a fresh set to scope deduplication to
    /// one logical run.
    pub fn new(settled: D) -> Self {
        Self { settled }
    }

    pub fn settled(&self) -> &D {
        &self.settled
    }

    /// Collects and retires escrow groups for `(event, match_id)`.
    ///
    /// Every escrow block seen here is admitted into the settled set, even
    /// if a later transfer retires it in the same scan. A transfer only
    /// retires groups collected before it in ledger order.
    pub fn outstanding_groups(
        &self,
        ledger: &Ledger,
        event: &str,
        match_id: &str,
    ) -> Vec<EscrowGroup> {
        let filter = PayloadFilter::any().event(event).match_id(match_id);
        let mut groups: Vec<EscrowGroup> = Vec::new();

        for (block, payload) in ledger.select(&filter) {
            match payload {
                Payload::Escrow(e) => {
                    if self.settled.admit(&block.hash) {
                        groups.push(EscrowGroup {
                            hash: block.hash.clone(),
                            players: e.from.clone(),
                            wagers: e.wagers.clone(),
                            amounts: e.amount.clone(),
                            server: e.server.clone(),
                            event: e.event.clone(),
                        });
                    }
                }
                Payload::Transfer(t) => {
                    groups.retain(|g| !(g.server == t.server && g.event == t.event));
                }
                Payload::Coinbase(_) => {}
            }
        }

        groups
    }

    /// Computes one payout per outstanding escrow group, in ledger order.
    pub fn settle_all(
        &self,
        ledger: &Ledger,
        event: &str,
        team: &str,
        match_id: &str,
    ) -> Vec<PayoutTransaction> {
        let payouts: Vec<PayoutTransaction> = self
            .outstanding_groups(ledger, event, match_id)
            .iter()
            .map(|group| settle_group(group, team, match_id))
            .collect();

        tracing::debug!(
            event,
            match_id,
            team,
            groups = payouts.len(),
            "computed settlement payouts"
        );

        payouts
    }

    /// Computes the payout of the last outstanding escrow group.
    ///
    /// Earlier groups for the same `(event, match_id)` are admitted into the
    /// settled set but their payouts are dropped; use
    /// [`PayoutCalculator::settle_all`] to receive every group.
    pub fn settle(
        &self,
        ledger: &Ledger,
        event: &str,
        team: &str,
        match_id: &str,
    ) -> Option<PayoutTransaction> {
        let mut payouts = self.settle_all(ledger, event, team, match_id);
        if payouts.len() > 1 {
            tracing::warn!(
                event,
                match_id,
                dropped = payouts.len() - 1,
                "multiple escrow groups outstanding; only the last one is returned"
            );
        }
        payouts.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::tests::{dummy_ledger, escrow, players, transfer};

    fn calculator() -> PayoutCalculator {
        PayoutCalculator::default()
    }

    fn group(players_: &[&str], wagers: &[&str], amounts: &[f64]) -> EscrowGroup {
        EscrowGroup {
            hash: BlockHash::new("g"),
            players: players(players_),
            wagers: wagers.iter().map(|w| w.to_string()).collect(),
            amounts: amounts.to_vec(),
            server: "s1".to_string(),
            event: "e1".to_string(),
        }
    }

    fn entries(p: &PayoutTransaction) -> Vec<(&str, &str, f64)> {
        p.from
            .iter()
            .zip(&p.to)
            .zip(&p.amount)
            .map(|((f, t), a)| (f.as_str(), t.as_str(), *a))
            .collect()
    }

    #[test]
    fn two_winners_split_one_loser() {
        let g = group(&["A", "B", "C"], &["X", "Y", "X"], &[10.0, 10.0, 10.0]);
        let payout = settle_group(&g, "X", "m1");

        assert_eq!(
            entries(&payout),
            vec![
                ("A", "A", 10.0),
                ("C", "C", 10.0),
                ("B", "A", 5.0),
                ("B", "C", 5.0),
            ]
        );
        assert_eq!(payout.event, "e1");
        assert_eq!(payout.server, "s1");
        assert_eq!(payout.match_id, "m1");
    }

    #[test]
    fn small_loser_pays_large_winner_in_full() {
        let g = group(&["A", "B"], &["X", "Y"], &[100.0, 1.0]);
        let payout = settle_group(&g, "X", "m1");

        assert_eq!(entries(&payout), vec![("A", "A", 100.0), ("B", "A", 1.0)]);
    }

    #[test]
    fn winner_cap_refunds_loser_remainder() {
        let g = group(&["A", "B"], &["X", "Y"], &[2.0, 10.0]);
        let payout = settle_group(&g, "X", "m1");

        // A can win at most 2 / 1 from B; B gets the other 8 back.
        assert_eq!(
            entries(&payout),
            vec![("A", "A", 2.0), ("B", "A", 2.0), ("B", "B", 8.0)]
        );
        assert_eq!(payout.total(), 12.0);
    }

    #[test]
    fn no_winners_refunds_everyone() {
        let g = group(&["A", "B"], &["X", "Y"], &[3.0, 4.0]);
        let payout = settle_group(&g, "Z", "m1");

        assert_eq!(entries(&payout), vec![("A", "A", 3.0), ("B", "B", 4.0)]);
    }

    #[test]
    fn no_losers_returns_stakes() {
        let g = group(&["A", "B"], &["X", "X"], &[3.0, 4.0]);
        let payout = settle_group(&g, "X", "m1");

        assert_eq!(entries(&payout), vec![("A", "A", 3.0), ("B", "B", 4.0)]);
    }

    #[test]
    fn settle_collects_matching_escrow() {
        let ledger = dummy_ledger(vec![
            escrow("s1", "e1", "m1", &["A", "B", "C"], &["X", "Y", "X"], &[10.0, 10.0, 10.0]),
            escrow("s1", "e1", "m2", &["D"], &["X"], &[1.0]),
        ]);

        let calc = calculator();
        let payout = calc.settle(&ledger, "e1", "X", "m1").expect("payout");

        assert_eq!(payout.len(), 4);
        assert!(calc.settled().contains(&BlockHash::new("h1")));
        assert!(!calc.settled().contains(&BlockHash::new("h2")));
    }

    #[test]
    fn settled_escrow_is_not_paid_twice() {
        let ledger = dummy_ledger(vec![escrow("s1", "e1", "m1", &["A", "B"], &["X", "Y"], &[5.0, 5.0])]);

        let calc = calculator();
        assert!(calc.settle(&ledger, "e1", "X", "m1").is_some());
        assert!(calc.settle(&ledger, "e1", "X", "m1").is_none());
        assert_eq!(calc.settled().len(), 1);
    }

    #[test]
    fn shared_set_dedups_across_calculators() {
        let ledger = dummy_ledger(vec![escrow("s1", "e1", "m1", &["A"], &["X"], &[5.0])]);
        let shared = Arc::new(SettledEscrowSet::new());

        let first = PayoutCalculator::new(shared.clone());
        let second = PayoutCalculator::new(shared.clone());

        assert_eq!(first.settle_all(&ledger, "e1", "X", "m1").len(), 1);
        assert!(second.settle_all(&ledger, "e1", "X", "m1").is_empty());
    }

    #[test]
    fn transfer_retires_earlier_escrow() {
        let ledger = dummy_ledger(vec![
            escrow("s1", "e1", "m1", &["A", "B"], &["X", "Y"], &[5.0, 5.0]),
            transfer("s1", "e1", "m1", &["B"], &["A"], &[5.0]),
        ]);

        let calc = calculator();
        assert!(calc.settle(&ledger, "e1", "X", "m1").is_none());
        // Still admitted: a later run must not resurrect it.
        assert!(calc.settled().contains(&BlockHash::new("h1")));
    }

    #[test]
    fn transfer_before_escrow_does_not_retire_it() {
        let ledger = dummy_ledger(vec![
            transfer("s1", "e1", "m1", &["B"], &["A"], &[5.0]),
            escrow("s1", "e1", "m1", &["A", "B"], &["X", "Y"], &[5.0, 5.0]),
        ]);

        let payouts = calculator().settle_all(&ledger, "e1", "X", "m1");
        assert_eq!(payouts.len(), 1);
    }

    #[test]
    fn transfer_on_other_server_keeps_group() {
        let ledger = dummy_ledger(vec![
            escrow("s1", "e1", "m1", &["A"], &["X"], &[5.0]),
            transfer("s2", "e1", "m1", &["B"], &["B"], &[5.0]),
        ]);

        let groups = calculator().outstanding_groups(&ledger, "e1", "m1");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].server, "s1");
    }

    #[test]
    fn settle_keeps_only_last_group_but_settle_all_keeps_every_group() {
        let payloads = vec![
            escrow("s1", "e1", "m1", &["A", "B"], &["X", "Y"], &[5.0, 5.0]),
            escrow("s2", "e1", "m1", &["C", "D"], &["X", "Y"], &[7.0, 7.0]),
        ];

        let all = calculator().settle_all(&dummy_ledger(payloads.clone()), "e1", "X", "m1");
        let servers: Vec<&str> = all.iter().map(|p| p.server.as_str()).collect();
        assert_eq!(servers, vec!["s1", "s2"]);

        let last = calculator()
            .settle(&dummy_ledger(payloads), "e1", "X", "m1")
            .expect("payout");
        assert_eq!(last.server, "s2");
    }

    #[test]
    fn into_transfer_keeps_entries_and_oracle() {
        let g = group(&["A", "B"], &["X", "Y"], &[1.0, 1.0]);
        let transfer = settle_group(&g, "X", "m1").into_transfer(vec![
            "90".to_string(),
            "final".to_string(),
            "X".to_string(),
        ]);

        assert!(transfer.is_oracle_triggered());
        assert_eq!(transfer.from, players(&["A", "B"]));
        assert_eq!(transfer.to, players(&["A", "A"]));
        assert_eq!(transfer.match_id, "m1");
    }
}
