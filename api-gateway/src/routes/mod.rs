//! HTTP route handlers.

pub mod accounts;
pub mod escrows;
pub mod health;
pub mod metrics;
pub mod payouts;
pub mod settlements;
pub mod sync;
