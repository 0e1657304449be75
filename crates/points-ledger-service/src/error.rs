//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map, Value};

use points_ledger_core::LedgerError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// The `userId` field is not a valid identifier.
    #[error("invalid user ID: {0}")]
    InvalidUserId(String),

    /// The body or query string could not be decoded.
    #[error("{0}")]
    InvalidRequest(&'static str),

    /// Ledger rejection or fault.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(flatten)]
    details: Map<String, Value>,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String, Value) {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                self.to_string(),
                Value::Null,
            ),
            Self::InvalidUserId(_) => (
                StatusCode::BAD_REQUEST,
                "INVALID_USER_ID",
                self.to_string(),
                Value::Null,
            ),
            Self::InvalidRequest(message) => (
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
                (*message).to_string(),
                Value::Null,
            ),
            Self::Ledger(err) => ledger_parts(err),
        }
    }
}

fn ledger_parts(err: &LedgerError) -> (StatusCode, &'static str, String, Value) {
    let message = err.to_string();
    match err {
        LedgerError::InvalidAmount(_) => {
            (StatusCode::BAD_REQUEST, "INVALID_AMOUNT", message, Value::Null)
        }
        LedgerError::MissingField(field) => (
            StatusCode::BAD_REQUEST,
            "MISSING_FIELD",
            message,
            json!({ "field": field }),
        ),
        LedgerError::InvalidTransactionType(_) => (
            StatusCode::BAD_REQUEST,
            "INVALID_TRANSACTION_TYPE",
            message,
            Value::Null,
        ),
        LedgerError::InvalidMetadata(_) => (
            StatusCode::BAD_REQUEST,
            "INVALID_METADATA",
            message,
            Value::Null,
        ),
        LedgerError::InvalidId(_) => (
            StatusCode::BAD_REQUEST,
            "INVALID_USER_ID",
            message,
            Value::Null,
        ),
        LedgerError::UnknownFeature { feature_key } => (
            StatusCode::NOT_FOUND,
            "UNKNOWN_FEATURE",
            message,
            json!({ "featureKey": feature_key }),
        ),
        LedgerError::BelowMinimumThreshold { minimum, requested } => (
            StatusCode::BAD_REQUEST,
            "BELOW_MINIMUM_THRESHOLD",
            format!("At least {minimum} points are required to convert, got {requested}"),
            json!({ "minimum": minimum, "requested": requested }),
        ),
        LedgerError::InsufficientBalance {
            currency,
            current_balance,
            required,
        } => {
            let shortfall = err.shortfall().unwrap_or_default();
            (
                StatusCode::PAYMENT_REQUIRED,
                "INSUFFICIENT_BALANCE",
                format!("You need {shortfall} more {currency}"),
                json!({
                    "currency": currency,
                    "currentBalance": current_balance,
                    "required": required,
                    "shortfall": shortfall,
                }),
            )
        }
        LedgerError::DuplicateEvent { key } => (
            StatusCode::CONFLICT,
            "DUPLICATE_EVENT",
            format!("Event {key} already processed"),
            json!({ "idempotencyKey": key }),
        ),
        LedgerError::Configuration(msg) | LedgerError::Storage(msg) => {
            tracing::error!(error = %msg, "Ledger unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "The ledger is temporarily unavailable".to_string(),
                Value::Null,
            )
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        let body = ErrorResponse {
            success: false,
            error: code,
            message,
            details: match details {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<points_ledger_store::StoreError> for ApiError {
    fn from(err: points_ledger_store::StoreError) -> Self {
        Self::Ledger(err.into())
    }
}
