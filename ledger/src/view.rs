//! Read-only, filtered access to an in-memory ledger.
//!
//! [`Ledger`] is an ordered, append-only sequence of [`Block`]s where
//! position 0 is the payload-less genesis block. Every other component scans
//! it through [`Ledger::select`] or one of the typed helpers
//! ([`Ledger::coinbases`], [`Ledger::escrows`], [`Ledger::transfers`]), which
//! always yield blocks in position order (oldest first).

use serde::{Deserialize, Serialize};

use crate::types::{
    Block, CoinbasePayload, EscrowPayload, Payload, PayloadKind, TransferPayload,
};

/// Predicate over `(type, server, event, match)` of a block payload.
///
/// Unset fields match anything. Coinbase payloads carry no event or match,
/// so a filter constraining either never matches a coinbase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PayloadFilter {
    kind: Option<PayloadKind>,
    server: Option<String>,
    event: Option<String>,
    match_id: Option<String>,
}

impl PayloadFilter {
    /// Filter that matches every payload.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: PayloadKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn match_id(mut self, match_id: impl Into<String>) -> Self {
        self.match_id = Some(match_id.into());
        self
    }

    pub fn matches(&self, payload: &Payload) -> bool {
        if self.kind.is_some_and(|k| k != payload.kind()) {
            return false;
        }
        if self.server.as_deref().is_some_and(|s| s != payload.server()) {
            return false;
        }
        if let Some(event) = &self.event {
            if payload.event() != Some(event.as_str()) {
                return false;
            }
        }
        if let Some(match_id) = &self.match_id {
            if payload.match_id() != Some(match_id.as_str()) {
                return false;
            }
        }
        true
    }
}

/// In-memory ledger snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    chain: Vec<Block>,
}

impl Ledger {
    /// Wraps an ordered list of blocks, genesis first.
    pub fn new(chain: Vec<Block>) -> Self {
        Self { chain }
    }

    /// Number of blocks, including genesis.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Returns the block at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Block> {
        self.chain.get(index)
    }

    /// Returns all blocks in position order.
    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    /// Returns the newest block, if any.
    pub fn tip(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Appends blocks at the end of the ledger, in the given order.
    ///
    /// No linkage or height checks are performed; callers appending the
    /// output of [`crate::sync::reconcile`] must decide how to handle a
    /// fork before calling this.
    pub fn extend<I>(&mut self, blocks: I)
    where
        I: IntoIterator<Item = Block>,
    {
        self.chain.extend(blocks);
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.chain
    }

    /// Lazily yields every block whose payload matches `filter`.
    ///
    /// Payload-less blocks (genesis) are never yielded.
    pub fn select<'a>(
        &'a self,
        filter: &'a PayloadFilter,
    ) -> impl Iterator<Item = (&'a Block, &'a Payload)> + 'a {
        self.chain.iter().filter_map(move |block| {
            let payload = block.payload.as_ref()?;
            filter.matches(payload).then_some((block, payload))
        })
    }

    /// Coinbase blocks matching `filter`.
    pub fn coinbases<'a>(
        &'a self,
        filter: &'a PayloadFilter,
    ) -> impl Iterator<Item = (&'a Block, &'a CoinbasePayload)> + 'a {
        self.select(filter).filter_map(|(block, payload)| match payload {
            Payload::Coinbase(p) => Some((block, p)),
            _ => None,
        })
    }

    /// Escrow blocks matching `filter`.
    pub fn escrows<'a>(
        &'a self,
        filter: &'a PayloadFilter,
    ) -> impl Iterator<Item = (&'a Block, &'a EscrowPayload)> + 'a {
        self.select(filter).filter_map(|(block, payload)| match payload {
            Payload::Escrow(p) => Some((block, p)),
            _ => None,
        })
    }

    /// Transfer blocks matching `filter`.
    pub fn transfers<'a>(
        &'a self,
        filter: &'a PayloadFilter,
    ) -> impl Iterator<Item = (&'a Block, &'a TransferPayload)> + 'a {
        self.select(filter).filter_map(|(block, payload)| match payload {
            Payload::Transfer(p) => Some((block, p)),
            _ => None,
        })
    }
}

impl From<Vec<Block>> for Ledger {
    fn from(chain: Vec<Block>) -> Self {
        Self::new(chain)
    }
}
