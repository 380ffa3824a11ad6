//! Metrics and instrumentation for the ledger.
//!
//! This module defines Prometheus-compatible metrics for ledger scans,
//! settlement and reconciliation. Exposition is left to the embedding
//! binary, which serves [`MetricsRegistry::gather_text`] on `/metrics`.
//!
//! Typical usage:
//!
//! ```ignore
//! use std::sync::Arc;
//! use ledger::metrics::MetricsRegistry;
//!
//! let registry = Arc::new(MetricsRegistry::new()?);
//! registry.ledger.settlements_total.inc();
//! let body = registry.gather_text();
//! ```

pub mod registry;

pub use registry::{LedgerMetrics, MetricsRegistry};
