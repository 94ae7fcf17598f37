//! Crate-wide error types

use std::fmt;

/// Failures reported by a token ledger (the external balance authority)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerError {
    /// No signed-in user could be resolved for the request
    UnknownUser,
    /// Balance is below the amount a debit needs
    InsufficientBalance { balance: i64, needed: i64 },
    /// The ledger could not be reached or answered with garbage
    Transport(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownUser => write!(f, "no signed-in user"),
            Self::InsufficientBalance { balance, needed } => {
                write!(f, "insufficient balance: have {balance}, need {needed}")
            }
            Self::Transport(reason) => write!(f, "ledger unreachable: {reason}"),
        }
    }
}

impl std::error::Error for LedgerError {}

#[derive(Clone, Debug, PartialEq)]
pub enum HubError {
    /// Key-value storage refused a read or write
    Storage { key: String, reason: String },
    /// JSON could not be decoded into the expected shape
    Parse { what: &'static str, reason: String },
    /// A configuration value is out of range
    Config { field: &'static str, reason: String },
    /// Balance authority failure
    Ledger(LedgerError),
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage { key, reason } => write!(f, "storage error on '{key}': {reason}"),
            Self::Parse { what, reason } => write!(f, "malformed {what}: {reason}"),
            Self::Config { field, reason } => write!(f, "invalid config '{field}': {reason}"),
            Self::Ledger(err) => write!(f, "ledger error: {err}"),
        }
    }
}

impl std::error::Error for HubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ledger(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LedgerError> for HubError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}
