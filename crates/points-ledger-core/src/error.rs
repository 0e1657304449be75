//! Error types for the points ledger.

use crate::account::Currency;
use crate::ids::IdError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in ledger operations.
///
/// Validation errors and business-rule rejections are raised before anything is written.
/// `Storage` is the only variant that signals a system fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Amount was zero, negative, or would overflow the account.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A required field was absent or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The transaction type is unknown or not allowed for the operation.
    #[error("invalid transaction type: {0}")]
    InvalidTransactionType(String),

    /// Caller metadata was malformed or tried to set a reserved key.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// The feature key is not in the feature cost table.
    #[error("unknown feature: {feature_key}")]
    UnknownFeature {
        /// The feature key that was requested.
        feature_key: String,
    },

    /// Conversion requested fewer points than the minimum block.
    #[error("conversion below minimum: minimum={minimum}, requested={requested}")]
    BelowMinimumThreshold {
        /// Minimum points per conversion.
        minimum: i64,
        /// Points the caller asked to convert.
        requested: i64,
    },

    /// Sub-balance too low for the requested debit.
    #[error("insufficient {currency}: balance={current_balance}, required={required}")]
    InsufficientBalance {
        /// The sub-ledger that would have gone negative.
        currency: Currency,
        /// Balance at the time of the check.
        current_balance: i64,
        /// Amount the operation needed.
        required: i64,
    },

    /// The idempotency key was already used for this user.
    #[error("duplicate event: {key}")]
    DuplicateEvent {
        /// The replayed idempotency key.
        key: String,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Static configuration could not be loaded.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Storage failed; nothing was applied.
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Whether the error is a caller or business-rule outcome rather than a fault.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Configuration(_))
    }

    /// How many more units the caller needs, for insufficient-balance rejections.
    #[must_use]
    pub fn shortfall(&self) -> Option<i64> {
        match self {
            Self::InsufficientBalance {
                current_balance,
                required,
                ..
            } => Some(required.saturating_sub(*current_balance)),
            _ => None,
        }
    }
}
