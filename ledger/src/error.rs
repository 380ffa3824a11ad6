use std::{fmt, io};

/// Error type returned when a block or payload is structurally malformed.
#[derive(Debug)]
pub enum ValidationError {
    /// Block is invalid according to a fixed structural rule.
    Invalid(&'static str),
    /// Block is invalid with a dynamic error message.
    Custom(String),
}

/// Errors raised while obtaining a ledger snapshot.
///
/// Query operations never surface these to their callers; the service layer
/// maps every variant to the operation's default value. They exist so that
/// sources and loaders can be tested and logged precisely.
#[derive(Debug)]
pub enum LedgerError {
    /// Persisted ledger could not be read.
    Unavailable(io::Error),
    /// Persisted ledger is not a valid ledger document.
    Decode(serde_json::Error),
    /// Ledger decoded but contains a malformed block.
    Invalid {
        /// Position of the offending block.
        index: usize,
        source: ValidationError,
    },
}

impl From<io::Error> for LedgerError {
    fn from(e: io::Error) -> Self {
        LedgerError::Unavailable(e)
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Decode(e)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Invalid(msg) => write!(f, "invalid block: {msg}"),
            ValidationError::Custom(msg) => write!(f, "invalid block: {msg}"),
        }
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Unavailable(e) => write!(f, "ledger unavailable: {e}"),
            LedgerError::Decode(e) => write!(f, "ledger decode error: {e}"),
            LedgerError::Invalid { index, source } => write!(f, "block {index}: {source}"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Unavailable(e) => Some(e),
            LedgerError::Decode(e) => Some(e),
            LedgerError::Invalid { source, .. } => Some(source),
        }
    }
}
