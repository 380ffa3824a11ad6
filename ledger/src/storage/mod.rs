//! Ledger sources.
//!
//! A [`LedgerSource`] produces a fresh in-memory [`Ledger`] snapshot on
//! every call. This module provides:
//!
//! - a JSON file source ([`json::JsonFileLedger`]) reading the persisted
//!   `{"chain": [...]}` document written by the node,
//! - an in-memory source ([`mem::InMemoryLedger`]) suitable for tests and
//!   for peers whose chain arrived over the network.

pub mod json;
pub mod mem;

pub use json::JsonFileLedger;
pub use mem::InMemoryLedger;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::Block;
use crate::validation::{BlockValidator, StructuralValidity};
use crate::view::Ledger;

/// Abstract ledger snapshot provider.
///
/// Implementations may hit the filesystem or the network; they must not
/// cache derived state between calls.
pub trait LedgerSource {
    /// Loads the current ledger snapshot.
    fn load(&self) -> Result<Ledger, LedgerError>;
}

/// Persisted ledger document: `{"chain": [genesis, block1, ...]}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub chain: Vec<Block>,
}

/// Builds an in-memory ledger from a decoded document.
///
/// Every block is checked with [`StructuralValidity`]; the first malformed
/// block aborts the load.
pub fn load_ledger(document: LedgerDocument) -> Result<Ledger, LedgerError> {
    let validator = StructuralValidity;
    for (index, block) in document.chain.iter().enumerate() {
        validator
            .validate(block)
            .map_err(|source| LedgerError::Invalid { index, source })?;
    }
    Ok(Ledger::new(document.chain))
}

/// Decodes and validates a ledger from its JSON text.
pub fn parse_ledger(json: &str) -> Result<Ledger, LedgerError> {
    let document: LedgerDocument = serde_json::from_str(json)?;
    load_ledger(document)
}

impl From<Ledger> for LedgerDocument {
    fn from(ledger: Ledger) -> Self {
        Self {
            chain: ledger.into_blocks(),
        }
    }
}

impl<T: LedgerSource + ?Sized> LedgerSource for &T {
    fn load(&self) -> Result<Ledger, LedgerError> {
        (**self).load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEDGER_JSON: &str = r#"{
        "chain": [
            {"timestamp": 1700000000000, "issuer": "g", "signature": "s", "hash": "h0", "nonce": 0},
            {
                "height": 1,
                "timestamp": 1700000001000,
                "previousHash": "h0",
                "hash": "h1",
                "issuer": "node",
                "signature": "sig",
                "nonce": 17,
                "payload": {"type": "coinbase", "to": ["alice"], "amount": [100], "server": "s1"}
            },
            {
                "height": 2,
                "timestamp": 1700000002000,
                "previousHash": "h1",
                "hash": "h2",
                "payload": {
                    "type": "escrow",
                    "from": ["alice"],
                    "wagers": ["red"],
                    "amount": ["10"],
                    "server": "s1",
                    "event": 5,
                    "match": 9
                }
            }
        ]
    }"#;

    #[test]
    fn parses_writer_document() {
        let ledger = parse_ledger(LEDGER_JSON).expect("valid ledger");

        assert_eq!(ledger.len(), 3);
        assert!(ledger.blocks()[0].is_genesis());
        let escrow = ledger.blocks()[2].escrow().expect("escrow block");
        assert_eq!(escrow.amount, vec![10.0]);
        assert_eq!(escrow.event, "5");
        assert_eq!(escrow.match_id, "9");
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_ledger("{not json").unwrap_err();
        assert!(matches!(err, LedgerError::Decode(_)));
    }

    #[test]
    fn reports_index_of_malformed_block() {
        let json = r#"{"chain": [
            {"timestamp": 0, "hash": "h0"},
            {"height": 1, "timestamp": 1, "hash": "h1",
             "payload": {"type": "coinbase", "to": ["a", "b"], "amount": [1], "server": "s"}}
        ]}"#;

        match parse_ledger(json).unwrap_err() {
            LedgerError::Invalid { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn document_roundtrips_through_ledger() {
        let ledger = parse_ledger(LEDGER_JSON).expect("valid ledger");
        let text = serde_json::to_string(&LedgerDocument::from(ledger.clone())).expect("encode");

        assert_eq!(parse_ledger(&text).expect("re-decode"), ledger);
    }
}
