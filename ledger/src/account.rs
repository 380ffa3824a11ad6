//! Per-player account aggregation.
//!
//! Balances are never stored; they are derived on every query by scanning
//! the ledger:
//!
//! - coinbase credits (first occurrence of the player per block),
//! - transfer credits (every occurrence of the player in `to`),
//! - escrow debits (every occurrence of the player in `from`).

use serde::Serialize;

use crate::types::{BlockHash, Payload, PlayerId};
use crate::view::{Ledger, PayloadFilter};

/// Direction and origin of one account movement.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Funds issued by a coinbase.
    Coinbase,
    /// Funds received through a transfer.
    Winnings,
    /// Funds staked into an escrow.
    Stake,
}

/// One credit or debit touching a player's account.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccountEntry {
    pub height: u64,
    pub hash: BlockHash,
    pub kind: EntryKind,
    /// Unsigned amount; see [`AccountEntry::signed_amount`].
    pub amount: f64,
}

impl AccountEntry {
    /// Amount as it affects the balance: stakes are negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            EntryKind::Stake => -self.amount,
            EntryKind::Coinbase | EntryKind::Winnings => self.amount,
        }
    }
}

/// Balance of a player together with the movements that produced it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Statement {
    pub balance: f64,
    pub history: Vec<AccountEntry>,
}

/// Stateless account queries over a ledger snapshot.
#[derive(Clone, Copy, Debug)]
pub struct AccountAggregator<'a> {
    ledger: &'a Ledger,
}

impl<'a> AccountAggregator<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Sum of coinbase issuance to `player`.
    ///
    /// Only the first index at which `player` appears in a block's `to` list
    /// counts; duplicates within one coinbase are ignored.
    pub fn coinbase_total(&self, player: &PlayerId) -> f64 {
        let filter = PayloadFilter::any();
        self.ledger
            .coinbases(&filter)
            .filter_map(|(_, cb)| {
                let idx = cb.to.iter().position(|p| p == player)?;
                cb.amount.get(idx).copied()
            })
            .sum()
    }

    /// Sum of every transfer amount paid to `player`.
    pub fn win_total(&self, player: &PlayerId) -> f64 {
        let filter = PayloadFilter::any();
        self.ledger
            .transfers(&filter)
            .flat_map(|(_, t)| t.to.iter().zip(&t.amount))
            .filter(|(to, _)| *to == player)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Sum of every amount `player` has staked into escrow.
    pub fn loss_total(&self, player: &PlayerId) -> f64 {
        let filter = PayloadFilter::any();
        self.ledger
            .escrows(&filter)
            .flat_map(|(_, e)| e.from.iter().zip(&e.amount))
            .filter(|(from, _)| *from == player)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Returns `true` if a coinbase on `server` already issued funds to any
    /// of `players`.
    pub fn has_coinbase(&self, server: &str, players: &[PlayerId]) -> bool {
        let filter = PayloadFilter::any().server(server);
        self.ledger
            .coinbases(&filter)
            .any(|(_, cb)| players.iter().any(|p| cb.to.contains(p)))
    }

    /// Balance (`coinbase + wins - losses`) and account history of `player`.
    pub fn statement(&self, player: &PlayerId) -> Statement {
        let balance =
            self.coinbase_total(player) + self.win_total(player) - self.loss_total(player);

        Statement {
            balance,
            history: self.history(player),
        }
    }

    /// All movements touching `player`, in ledger order.
    pub fn history(&self, player: &PlayerId) -> Vec<AccountEntry> {
        let filter = PayloadFilter::any();
        let mut entries = Vec::new();

        for (block, payload) in self.ledger.select(&filter) {
            let entry = |kind, amount| AccountEntry {
                height: block.height,
                hash: block.hash.clone(),
                kind,
                amount,
            };

            match payload {
                Payload::Coinbase(cb) => {
                    if let Some(amount) = cb
                        .to
                        .iter()
                        .position(|p| p == player)
                        .and_then(|idx| cb.amount.get(idx))
                    {
                        entries.push(entry(EntryKind::Coinbase, *amount));
                    }
                }
                Payload::Transfer(t) => {
                    for (_, amount) in t.to.iter().zip(&t.amount).filter(|(to, _)| *to == player) {
                        entries.push(entry(EntryKind::Winnings, *amount));
                    }
                }
                Payload::Escrow(e) => {
                    for (_, amount) in e.from.iter().zip(&e.amount).filter(|(from, _)| *from == player)
                    {
                        entries.push(entry(EntryKind::Stake, *amount));
                    }
                }
            }
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::tests::{coinbase, dummy_ledger, escrow, players, transfer};

    fn alice() -> PlayerId {
        PlayerId::new("alice")
    }

    #[test]
    fn coinbase_counts_first_index_only() {
        let ledger = dummy_ledger(vec![
            coinbase("s1", &["alice", "bob", "alice"], &[10.0, 20.0, 99.0]),
            coinbase("s2", &["alice"], &[5.0]),
        ]);

        let accounts = AccountAggregator::new(&ledger);
        assert_eq!(accounts.coinbase_total(&alice()), 15.0);
        assert_eq!(accounts.coinbase_total(&PlayerId::new("bob")), 20.0);
    }

    #[test]
    fn wins_count_every_occurrence() {
        let ledger = dummy_ledger(vec![
            transfer("s1", "e1", "m1", &["bob", "carol"], &["alice", "alice"], &[3.0, 4.0]),
            transfer("s1", "e2", "m1", &["alice"], &["alice"], &[10.0]),
            transfer("s1", "e3", "m1", &["alice"], &["bob"], &[7.0]),
        ]);

        let accounts = AccountAggregator::new(&ledger);
        assert_eq!(accounts.win_total(&alice()), 17.0);
    }

    #[test]
    fn losses_count_every_stake() {
        let ledger = dummy_ledger(vec![
            escrow("s1", "e1", "m1", &["alice", "bob", "alice"], &["x", "y", "y"], &[1.0, 2.0, 3.0]),
            escrow("s2", "e2", "m1", &["alice"], &["x"], &[4.0]),
        ]);

        let accounts = AccountAggregator::new(&ledger);
        assert_eq!(accounts.loss_total(&alice()), 8.0);
        assert_eq!(accounts.loss_total(&PlayerId::new("bob")), 2.0);
    }

    #[test]
    fn statement_balance_matches_history() {
        let ledger = dummy_ledger(vec![
            coinbase("s1", &["alice", "bob"], &[100.0, 100.0]),
            escrow("s1", "e1", "m1", &["alice", "bob"], &["x", "y"], &[10.0, 10.0]),
            transfer("s1", "e1", "m1", &["alice", "bob"], &["alice", "alice"], &[10.0, 10.0]),
        ]);

        let statement = AccountAggregator::new(&ledger).statement(&alice());
        assert_eq!(statement.balance, 110.0);

        let kinds: Vec<EntryKind> = statement.history.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntryKind::Coinbase,
                EntryKind::Stake,
                EntryKind::Winnings,
                EntryKind::Winnings
            ]
        );

        let replayed: f64 = statement.history.iter().map(AccountEntry::signed_amount).sum();
        assert_eq!(replayed, statement.balance);
    }

    #[test]
    fn unknown_player_has_zero_balance_and_no_history() {
        let ledger = dummy_ledger(vec![coinbase("s1", &["bob"], &[1.0])]);
        let statement = AccountAggregator::new(&ledger).statement(&alice());
        assert_eq!(statement, Statement::default());
    }

    #[test]
    fn has_coinbase_is_scoped_to_server() {
        let ledger = dummy_ledger(vec![coinbase("s1", &["alice"], &[1.0])]);
        let accounts = AccountAggregator::new(&ledger);

        assert!(accounts.has_coinbase("s1", &players(&["carol", "alice"])));
        assert!(!accounts.has_coinbase("s2", &players(&["alice"])));
        assert!(!accounts.has_coinbase("s1", &players(&["bob"])));
    }
}
