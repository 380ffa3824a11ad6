//! Wager ledger library crate.
//!
//! This crate answers derived questions over an append-only ledger of
//! coinbase, escrow and transfer blocks:
//!
//! - strongly-typed domain types (`types`),
//! - filtered read-only access to a ledger snapshot (`view`),
//! - per-player balances and statements (`account`),
//! - outstanding escrow tracking (`escrow`),
//! - pari-mutuel payout settlement (`payout`),
//! - the human-facing payout history (`history`),
//! - reconciliation against a peer's ledger (`sync`),
//! - structural block checks (`validation`) and ledger sources (`storage`),
//! - Prometheus-based metrics (`metrics`) and configuration (`config`).
//!
//! [`LedgerService`] composes these pieces behind a single handle that
//! loads a fresh snapshot per query.

pub mod account;
pub mod config;
pub mod error;
pub mod escrow;
pub mod history;
pub mod metrics;
pub mod payout;
pub mod service;
pub mod storage;
pub mod sync;
pub mod types;
pub mod validation;
pub mod view;

// Re-export top-level configuration and errors.
pub use config::LedgerConfig;
pub use error::{LedgerError, ValidationError};

// Re-export the query and settlement components.
pub use account::{AccountAggregator, AccountEntry, EntryKind, Statement};
pub use escrow::{EscrowBook, EscrowKey, EscrowTracker};
pub use history::{NameResolver, PayoutRecord, RawAddresses, payout_history};
pub use payout::{
    EscrowGroup, PayoutCalculator, PayoutTransaction, SettledEscrowSet, SettledEscrows,
    settle_group,
};
pub use sync::{SyncOutcome, diff, reconcile};
pub use view::{Ledger, PayloadFilter};

// Re-export storage backends and validity predicates.
pub use storage::{
    InMemoryLedger, JsonFileLedger, LedgerDocument, LedgerSource, load_ledger, parse_ledger,
};
pub use validation::{BlockValidator, StructuralValidity};

pub use metrics::{LedgerMetrics, MetricsRegistry};
pub use service::LedgerService;

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Ledger service reading the persisted JSON document.
pub type DefaultLedgerService = LedgerService<JsonFileLedger>;
