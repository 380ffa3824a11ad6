//! Core domain types used by the ledger.
//!
//! This module defines strongly-typed identifiers for players and blocks,
//! the [`Block`] record and its tagged [`Payload`] variants. The goal is to
//! avoid "naked" strings in public APIs where a value has a fixed role, and
//! to keep the payload shapes as a sum type instead of a loosely-typed
//! record with optional fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Block records and ledger linkage fields.
pub mod block;
/// Coinbase, escrow and transfer payloads.
pub mod payload;

pub use block::Block;
pub use payload::{CoinbasePayload, EscrowPayload, Payload, PayloadKind, TransferPayload};

/// Player identifier (the player's public address on the ledger).
///
/// The writer emits addresses as strings, but older records may carry
/// numeric identifiers; both decode to the same textual form.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(#[serde(deserialize_with = "de::string_or_number")] pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        PlayerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId(s.to_owned())
    }
}

/// Identifier of a block, as produced by the external hashing component.
///
/// The ledger never recomputes or verifies this value; it is only compared
/// for equality (reconciliation) and used as a dedup key (settlement).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHash(#[serde(deserialize_with = "de::string_or_number")] pub String);

impl BlockHash {
    pub fn new(hash: impl Into<String>) -> Self {
        BlockHash(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockHash {
    fn from(s: &str) -> Self {
        BlockHash(s.to_owned())
    }
}

/// Lenient decoders for fields the writer emits as either strings or
/// numbers (event ids, match ids, amounts, oracle tuples).
pub(crate) mod de {
    use std::fmt;

    use serde::Deserialize;
    use serde::de::{self, Deserializer, Visitor};

    struct StringOrNumber;

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_owned())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    struct Amount;

    impl<'de> Visitor<'de> for Amount {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            v.trim()
                .parse::<f64>()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StringOrNumber)
    }

    pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(Amount)
    }

    #[derive(Deserialize)]
    struct LenientString(#[serde(deserialize_with = "string_or_number")] String);

    #[derive(Deserialize)]
    struct LenientAmount(#[serde(deserialize_with = "amount")] f64);

    pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = Vec::<LenientString>::deserialize(deserializer)?;
        Ok(items.into_iter().map(|s| s.0).collect())
    }

    pub fn amounts<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = Vec::<LenientAmount>::deserialize(deserializer)?;
        Ok(items.into_iter().map(|a| a.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_id_accepts_strings_and_numbers() {
        let from_str: PlayerId = serde_json::from_str("\"0xabc\"").expect("string id");
        let from_num: PlayerId = serde_json::from_str("42").expect("numeric id");

        assert_eq!(from_str.as_str(), "0xabc");
        assert_eq!(from_num.as_str(), "42");
    }

    #[test]
    fn player_id_serializes_as_plain_string() {
        let id = PlayerId::new("alice");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice\"");
    }
}
