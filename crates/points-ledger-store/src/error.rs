//! Error types for ledger storage.

use points_ledger_core::{Currency, LedgerError};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A posting would have taken a sub-balance below zero.
    #[error("insufficient {currency}: balance={balance}, required={required}")]
    InsufficientBalance {
        /// The sub-ledger that was short.
        currency: Currency,
        /// Balance at the time of the check.
        balance: i64,
        /// Amount the posting needed.
        required: i64,
    },

    /// Idempotency key already used for this user.
    #[error("duplicate event: {key}")]
    DuplicateEvent {
        /// The replayed key.
        key: String,
    },

    /// The postings were malformed (empty batch, zero amount, overflow).
    #[error("invalid posting: {0}")]
    InvalidPosting(String),
}

impl From<LedgerError> for StoreError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance {
                currency,
                current_balance,
                required,
            } => Self::InsufficientBalance {
                currency,
                balance: current_balance,
                required,
            },
            LedgerError::DuplicateEvent { key } => Self::DuplicateEvent { key },
            other => Self::InvalidPosting(other.to_string()),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientBalance {
                currency,
                balance,
                required,
            } => Self::InsufficientBalance {
                currency,
                current_balance: balance,
                required,
            },
            StoreError::DuplicateEvent { key } => Self::DuplicateEvent { key },
            StoreError::InvalidPosting(msg) => Self::InvalidAmount(msg),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Storage(msg),
        }
    }
}
