// ledger/src/types/payload.rs

//! Payload types carried by ledger blocks.
//!
//! Every non-genesis block carries exactly one [`Payload`]:
//!
//! - a coinbase issuance of new funds to players,
//! - an escrow holding stakes pending the outcome of a match, or
//! - a transfer releasing funds once the outcome is known.
//!
//! In every payload the player lists (`from`/`to`), `wagers` and `amount`
//! are index-aligned: entry `i` of each list describes the same player.
//! Alignment is checked when a ledger is loaded (see
//! [`crate::validation`]), so scans may zip the lists freely.

use serde::{Deserialize, Serialize};

use super::{PlayerId, de};

/// Discriminant of a [`Payload`], used by ledger filters.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Coinbase,
    Escrow,
    Transfer,
}

/// Issuance of new funds to a list of players on one server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoinbasePayload {
    /// Receiving players.
    pub to: Vec<PlayerId>,

    /// Amount issued to `to[i]`.
    #[serde(deserialize_with = "de::amounts")]
    pub amount: Vec<f64>,

    /// Server (community) the issuance belongs to.
    #[serde(deserialize_with = "de::string_or_number")]
    pub server: String,
}

/// Stakes held in escrow until the outcome of a match is known.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscrowPayload {
    /// Players placing a wager.
    pub from: Vec<PlayerId>,

    /// Outcome (team) each player backed.
    #[serde(deserialize_with = "de::string_list")]
    pub wagers: Vec<String>,

    /// Amount staked by `from[i]`.
    #[serde(deserialize_with = "de::amounts")]
    pub amount: Vec<f64>,

    #[serde(deserialize_with = "de::string_or_number")]
    pub server: String,

    #[serde(deserialize_with = "de::string_or_number")]
    pub event: String,

    #[serde(
        rename = "match",
        default,
        deserialize_with = "de::string_or_number"
    )]
    pub match_id: String,
}

/// Release of escrowed funds, usually computed by settlement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferPayload {
    pub from: Vec<PlayerId>,
    pub to: Vec<PlayerId>,

    /// Amount moved from `from[i]` to `to[i]`.
    #[serde(deserialize_with = "de::amounts")]
    pub amount: Vec<f64>,

    #[serde(deserialize_with = "de::string_or_number")]
    pub server: String,

    #[serde(deserialize_with = "de::string_or_number")]
    pub event: String,

    #[serde(
        rename = "match",
        default,
        deserialize_with = "de::string_or_number"
    )]
    pub match_id: String,

    /// Outcome details supplied by the oracle that triggered this transfer,
    /// as `[minute, <opaque>, team, ...]`.
    ///
    /// Empty for manual or administrative transfers.
    #[serde(default, deserialize_with = "de::string_list")]
    pub oracle: Vec<String>,
}

impl TransferPayload {
    /// Returns `true` if this transfer was triggered by an outcome oracle.
    pub fn is_oracle_triggered(&self) -> bool {
        !self.oracle.is_empty()
    }
}

/// Tagged payload of a ledger block.
///
/// Serialized as an internally-tagged object, e.g.
/// `{"type": "escrow", "from": [...], "wagers": [...], ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    Coinbase(CoinbasePayload),
    Escrow(EscrowPayload),
    Transfer(TransferPayload),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Coinbase(_) => PayloadKind::Coinbase,
            Payload::Escrow(_) => PayloadKind::Escrow,
            Payload::Transfer(_) => PayloadKind::Transfer,
        }
    }

    pub fn server(&self) -> &str {
        match self {
            Payload::Coinbase(p) => &p.server,
            Payload::Escrow(p) => &p.server,
            Payload::Transfer(p) => &p.server,
        }
    }

    /// Event id, if this payload belongs to an event (coinbases do not).
    pub fn event(&self) -> Option<&str> {
        match self {
            Payload::Coinbase(_) => None,
            Payload::Escrow(p) => Some(&p.event),
            Payload::Transfer(p) => Some(&p.event),
        }
    }

    /// Match id, if this payload belongs to an event (coinbases do not).
    pub fn match_id(&self) -> Option<&str> {
        match self {
            Payload::Coinbase(_) => None,
            Payload::Escrow(p) => Some(&p.match_id),
            Payload::Transfer(p) => Some(&p.match_id),
        }
    }
}
