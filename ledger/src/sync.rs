//! Reconciliation of a local ledger against a peer's copy.
//!
//! Two entry points are provided:
//!
//! - [`diff`]: the position-wise comparison used by the appender. Every
//!   remote block whose hash differs from the local block at the same
//!   position, or that lies beyond the local tip, is returned. Diverging
//!   local blocks are never removed.
//! - [`reconcile`]: the same comparison, but reporting a diverging prefix
//!   as [`SyncOutcome::Fork`] so the caller can choose a rollback policy
//!   instead of appending onto a forked history.
//!
//! Genesis (position 0) is assumed shared and is never compared.

use serde::Serialize;

use crate::types::Block;
use crate::view::Ledger;

/// Result of comparing a local ledger with a remote one.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyncOutcome {
    /// Local is a prefix of remote; `blocks` is the missing suffix
    /// (empty when already up to date).
    Append { blocks: Vec<Block> },
    /// Local and remote disagree at `diverge_at`; `blocks` is the remote
    /// history from that position on.
    Fork {
        #[serde(rename = "divergeAt")]
        diverge_at: usize,
        blocks: Vec<Block>,
    },
}

impl Default for SyncOutcome {
    /// Nothing to append.
    fn default() -> Self {
        SyncOutcome::Append { blocks: Vec::new() }
    }
}

impl SyncOutcome {
    pub fn blocks(&self) -> &[Block] {
        match self {
            SyncOutcome::Append { blocks } | SyncOutcome::Fork { blocks, .. } => blocks,
        }
    }

    pub fn into_blocks(self) -> Vec<Block> {
        match self {
            SyncOutcome::Append { blocks } | SyncOutcome::Fork { blocks, .. } => blocks,
        }
    }

    pub fn is_fork(&self) -> bool {
        matches!(self, SyncOutcome::Fork { .. })
    }

    /// `true` when nothing needs to be appended.
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, SyncOutcome::Append { blocks } if blocks.is_empty())
    }
}

/// Returns the remote blocks missing from `local`, in position order.
///
/// For each position `i` in `1..remote.len()`, `remote[i]` is included
/// unless `local[i]` exists and carries the same hash.
pub fn diff(local: &Ledger, remote: &Ledger) -> Vec<Block> {
    remote
        .blocks()
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(i, block)| local.get(*i).is_none_or(|l| l.hash != block.hash))
        .map(|(_, block)| block.clone())
        .collect()
}

/// Compares `local` against `remote`, detecting a diverging prefix.
pub fn reconcile(local: &Ledger, remote: &Ledger) -> SyncOutcome {
    let shared = local.len().min(remote.len());

    let diverge_at = (1..shared).find(|&i| {
        match (local.get(i), remote.get(i)) {
            (Some(l), Some(r)) => l.hash != r.hash,
            _ => false,
        }
    });

    match diverge_at {
        Some(at) => {
            tracing::warn!(
                diverge_at = at,
                local_len = local.len(),
                remote_len = remote.len(),
                "remote ledger diverges from local history"
            );
            SyncOutcome::Fork {
                diverge_at: at,
                blocks: remote.blocks()[at..].to_vec(),
            }
        }
        None => SyncOutcome::Append {
            blocks: remote
                .blocks()
                .get(local.len().max(1)..)
                .unwrap_or_default()
                .to_vec(),
        },
    }
}
