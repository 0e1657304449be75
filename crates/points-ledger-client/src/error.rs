//! Client error types.

/// Errors that can occur when using the ledger client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The user cannot pay for the request.
    #[error("insufficient balance: balance={current_balance}, required={required}")]
    InsufficientBalance {
        /// Balance at the time of the request.
        current_balance: i64,
        /// Amount the request needed.
        required: i64,
    },

    /// Conversion requested fewer points than the minimum block.
    #[error("below minimum conversion: minimum={minimum}, requested={requested}")]
    BelowMinimumThreshold {
        /// Minimum points per conversion.
        minimum: i64,
        /// Points requested.
        requested: i64,
    },

    /// The idempotency key was already used.
    #[error("duplicate event: {idempotency_key}")]
    DuplicateEvent {
        /// The replayed key.
        idempotency_key: String,
    },

    /// A success response whose body did not match the expected shape.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Points the user still needs, for insufficient-balance errors.
    #[must_use]
    pub fn shortfall(&self) -> Option<i64> {
        match self {
            Self::InsufficientBalance {
                current_balance,
                required,
            } => Some(required.saturating_sub(*current_balance)),
            _ => None,
        }
    }
}
