//! JSON-file ledger source.
//!
//! Reads the whole persisted document on every [`LedgerSource::load`], so
//! each query sees the latest state written by the node.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LedgerError;
use crate::view::Ledger;

use super::{LedgerSource, parse_ledger};

/// Ledger persisted as a `{"chain": [...]}` JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
}

impl JsonFileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerSource for JsonFileLedger {
    fn load(&self) -> Result<Ledger, LedgerError> {
        let text = fs::read_to_string(&self.path)?;
        let ledger = parse_ledger(&text)?;
        tracing::debug!(
            path = %self.path.display(),
            blocks = ledger.len(),
            "loaded ledger snapshot"
        );
        Ok(ledger)
    }
}
