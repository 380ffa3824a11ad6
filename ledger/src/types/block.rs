// ledger/src/types/block.rs

//! Block records.
//!
//! A [`Block`] is one entry of the append-only ledger. Linkage and identity
//! fields (`previous_hash`, `hash`) and the mining/signing fields (`issuer`,
//! `signature`, `nonce`) are produced by external components; they are
//! carried through unchanged and never interpreted here, except that `hash`
//! is compared for equality.
//!
//! Field names follow the persisted JSON form (`previousHash`, etc.).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BlockHash, CoinbasePayload, EscrowPayload, Payload, TransferPayload};

/// One ledger entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Ordinal position; the genesis block is height 0.
    #[serde(default)]
    pub height: u64,

    /// Creation time, in milliseconds since Unix epoch.
    pub timestamp: u64,

    /// Hash of the previous block. Absent on genesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<BlockHash>,

    pub hash: BlockHash,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub issuer: Value,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub signature: Value,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub nonce: Value,

    /// Typed payload. `None` only for the genesis block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl Block {
    /// Builds a block with the given payload and no mining/signing data.
    pub fn new(
        height: u64,
        timestamp: u64,
        previous_hash: Option<BlockHash>,
        hash: BlockHash,
        payload: Option<Payload>,
    ) -> Self {
        Self {
            height,
            timestamp,
            previous_hash,
            hash,
            issuer: Value::Null,
            signature: Value::Null,
            nonce: Value::Null,
            payload,
        }
    }

    /// Returns `true` for a payload-less (genesis) block.
    pub fn is_genesis(&self) -> bool {
        self.payload.is_none()
    }

    pub fn coinbase(&self) -> Option<&CoinbasePayload> {
        match &self.payload {
            Some(Payload::Coinbase(p)) => Some(p),
            _ => None,
        }
    }

    pub fn escrow(&self) -> Option<&EscrowPayload> {
        match &self.payload {
            Some(Payload::Escrow(p)) => Some(p),
            _ => None,
        }
    }

    pub fn transfer(&self) -> Option<&TransferPayload> {
        match &self.payload {
            Some(Payload::Transfer(p)) => Some(p),
            _ => None,
        }
    }
}
