//! Human-facing payout history.
//!
//! Projects oracle-triggered transfer blocks of one server into
//! [`PayoutRecord`]s, replacing player addresses with display names.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{BlockHash, PlayerId};
use crate::view::{Ledger, PayloadFilter};

/// Maps player addresses to display names.
pub trait NameResolver {
    fn display_name(&self, player: &PlayerId) -> Option<String>;
}

impl NameResolver for HashMap<PlayerId, String> {
    fn display_name(&self, player: &PlayerId) -> Option<String> {
        self.get(player).cloned()
    }
}

/// Resolver that leaves every address as-is.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawAddresses;

impl NameResolver for RawAddresses {
    fn display_name(&self, _player: &PlayerId) -> Option<String> {
        None
    }
}

/// One settled payout as shown to users.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PayoutRecord {
    pub from: Vec<String>,
    pub to: Vec<String>,
    pub amount: Vec<f64>,
    pub hash: BlockHash,
    pub event: String,
    /// Match minute reported by the oracle (`oracle[0]`).
    pub minute: Option<String>,
    /// Winning team reported by the oracle (`oracle[2]`).
    pub team: Option<String>,
}

/// Returns one record per oracle-triggered transfer on `server`, in ledger
/// order. Manual transfers (empty oracle data) are skipped.
///
/// Addresses without a display name are reported unchanged.
pub fn payout_history<R>(ledger: &Ledger, server: &str, names: &R) -> Vec<PayoutRecord>
where
    R: NameResolver + ?Sized,
{
    let resolve = |players: &[PlayerId]| -> Vec<String> {
        players
            .iter()
            .map(|p| names.display_name(p).unwrap_or_else(|| p.to_string()))
            .collect()
    };

    let filter = PayloadFilter::any().server(server);
    ledger
        .transfers(&filter)
        .filter(|(_, t)| t.is_oracle_triggered())
        .map(|(block, t)| PayoutRecord {
            from: resolve(&t.from),
            to: resolve(&t.to),
            amount: t.amount.clone(),
            hash: block.hash.clone(),
            event: t.event.clone(),
            minute: t.oracle.first().cloned(),
            team: t.oracle.get(2).cloned(),
        })
        .collect()
}
