//! Structural validity predicates for ledger blocks.
//!
//! These checks run when a ledger is loaded, so that scans can rely on the
//! payload invariants without re-checking them:
//!
//! - parallel lists (`from`/`to`/`wagers`/`amount`) have equal lengths,
//! - amounts are finite numbers.
//!
//! Hash linkage, signatures and proof-of-work are not checked here.

use crate::error::ValidationError;
use crate::types::{Block, Payload};

/// Pluggable validity predicate for blocks.
///
/// Implementations should be deterministic and side-effect free.
pub trait BlockValidator {
    fn validate(&self, block: &Block) -> Result<(), ValidationError>;
}

/// Checks that every payload's parallel lists are index-aligned.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralValidity;

impl StructuralValidity {
    fn check_aligned(&self, lens: &[(&'static str, usize)]) -> Result<(), ValidationError> {
        let Some(&(first_name, first_len)) = lens.first() else {
            return Ok(());
        };
        for &(name, len) in &lens[1..] {
            if len != first_len {
                return Err(ValidationError::Custom(format!(
                    "`{name}` has {len} entries but `{first_name}` has {first_len}"
                )));
            }
        }
        Ok(())
    }

    fn check_amounts(&self, amounts: &[f64]) -> Result<(), ValidationError> {
        if amounts.iter().any(|a| !a.is_finite()) {
            return Err(ValidationError::Invalid("non-finite amount"));
        }
        Ok(())
    }
}

impl BlockValidator for StructuralValidity {
    fn validate(&self, block: &Block) -> Result<(), ValidationError> {
        match &block.payload {
            None => Ok(()),
            Some(Payload::Coinbase(p)) => {
                self.check_aligned(&[("to", p.to.len()), ("amount", p.amount.len())])?;
                self.check_amounts(&p.amount)
            }
            Some(Payload::Escrow(p)) => {
                self.check_aligned(&[
                    ("from", p.from.len()),
                    ("wagers", p.wagers.len()),
                    ("amount", p.amount.len()),
                ])?;
                self.check_amounts(&p.amount)
            }
            Some(Payload::Transfer(p)) => {
                self.check_aligned(&[
                    ("from", p.from.len()),
                    ("to", p.to.len()),
                    ("amount", p.amount.len()),
                ])?;
                self.check_amounts(&p.amount)
            }
        }
    }
}
