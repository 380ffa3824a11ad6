//! In-memory ledger source.
//!
//! Useful for unit tests and for comparing against a remote chain that has
//! already been received and decoded.

use crate::error::LedgerError;
use crate::view::Ledger;

use super::LedgerSource;

/// [`LedgerSource`] that hands out clones of a fixed snapshot.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    ledger: Ledger,
}

impl InMemoryLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Returns the stored snapshot.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Replaces the stored snapshot.
    pub fn replace(&mut self, ledger: Ledger) {
        self.ledger = ledger;
    }
}

impl LedgerSource for InMemoryLedger {
    fn load(&self) -> Result<Ledger, LedgerError> {
        Ok(self.ledger.clone())
    }
}
