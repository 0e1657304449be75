//! API handlers.

pub mod features;
pub mod health;
pub mod leaderboard;
pub mod points;
pub mod profiles;

use points_ledger_core::UserId;

use crate::error::ApiError;

/// Parse the caller-supplied `userId`.
pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    if raw.trim().is_empty() {
        return Err(points_ledger_core::LedgerError::MissingField("userId").into());
    }
    raw.parse()
        .map_err(|_| ApiError::InvalidUserId(raw.trim().to_string()))
}
