//! Outstanding-escrow tracking.
//!
//! An escrow is "outstanding" while more escrow blocks than transfer blocks
//! have been recorded for it. State is kept per `(server, event, match)` in
//! an [`EscrowBook`], so an escrow settled for one match never hides (or
//! fakes) an open escrow on another match of the same event.

use std::collections::HashMap;

use crate::types::Payload;
use crate::view::{Ledger, PayloadFilter};

/// Key of one escrow slot.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct EscrowKey {
    pub server: String,
    pub event: String,
    pub match_id: String,
}

impl EscrowKey {
    pub fn new(
        server: impl Into<String>,
        event: impl Into<String>,
        match_id: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            event: event.into(),
            match_id: match_id.into(),
        }
    }
}

/// Open-escrow counters keyed by `(server, event, match)`.
///
/// Each escrow block increments its slot, each transfer block decrements
/// it. A slot is open while its counter is strictly positive.
#[derive(Clone, Debug, Default)]
pub struct EscrowBook {
    open: HashMap<EscrowKey, i64>,
}

impl EscrowBook {
    /// Builds the book from a single scan of `ledger`.
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let filter = PayloadFilter::any();
        let mut book = Self::default();

        for (_, payload) in ledger.select(&filter) {
            match payload {
                Payload::Escrow(e) => {
                    *book
                        .open
                        .entry(EscrowKey::new(&e.server, &e.event, &e.match_id))
                        .or_default() += 1;
                }
                Payload::Transfer(t) => {
                    *book
                        .open
                        .entry(EscrowKey::new(&t.server, &t.event, &t.match_id))
                        .or_default() -= 1;
                }
                Payload::Coinbase(_) => {}
            }
        }

        book
    }

    /// Raw counter for `key` (escrows minus transfers).
    pub fn balance(&self, key: &EscrowKey) -> i64 {
        self.open.get(key).copied().unwrap_or(0)
    }

    pub fn is_open(&self, key: &EscrowKey) -> bool {
        self.balance(key) > 0
    }

    /// Returns `true` if any match of `(server, event)` has an open escrow.
    pub fn has_open(&self, server: &str, event: &str) -> bool {
        self.open
            .iter()
            .any(|(k, n)| *n > 0 && k.server == server && k.event == event)
    }

    /// All open slots, in no particular order.
    pub fn open_keys(&self) -> impl Iterator<Item = &EscrowKey> {
        self.open.iter().filter(|(_, n)| **n > 0).map(|(k, _)| k)
    }
}

/// Escrow lifecycle queries over a ledger snapshot.
#[derive(Clone, Copy, Debug)]
pub struct EscrowTracker<'a> {
    ledger: &'a Ledger,
}

impl<'a> EscrowTracker<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    pub fn book(&self) -> EscrowBook {
        EscrowBook::from_ledger(self.ledger)
    }

    /// Returns `true` if some escrow for `(server, event)` has not been
    /// matched by a transfer yet.
    pub fn has_outstanding_escrow(&self, server: &str, event: &str) -> bool {
        self.book().has_open(server, event)
    }

    /// Timestamp of the most recent escrow block for `(server, event)`.
    pub fn last_escrow_at(&self, server: &str, event: &str) -> Option<u64> {
        let filter = PayloadFilter::any().server(server).event(event);
        self.ledger
            .escrows(&filter)
            .last()
            .map(|(block, _)| block.timestamp)
    }

    /// Returns `true` if strictly more than `threshold_ms` has passed between
    /// the most recent escrow for `(server, event)` and `now_ms`.
    ///
    /// Returns `false` when no such escrow exists, when exactly
    /// `threshold_ms` has passed, and when `now_ms` precedes the escrow.
    pub fn elapsed_since_escrow(
        &self,
        server: &str,
        event: &str,
        now_ms: u64,
        threshold_ms: u64,
    ) -> bool {
        match self.last_escrow_at(server, event) {
            Some(at) => now_ms.saturating_sub(at) > threshold_ms,
            None => false,
        }
    }
}
