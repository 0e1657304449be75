//! Key encoding for the `RocksDB` column families.

use points_ledger_core::{TransactionId, UserId};

/// Length of an encoded user ID.
pub const USER_ID_LEN: usize = 16;

/// Length of an encoded transaction ID.
pub const TRANSACTION_ID_LEN: usize = 16;

/// Account (and profile) key.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Transaction key.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// User-transaction index key: `user_id (16) || transaction_id (16)`.
///
/// ULIDs are time-ordered, so a user's entries sort chronologically.
#[must_use]
pub fn user_transaction_key(user_id: &UserId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(USER_ID_LEN + TRANSACTION_ID_LEN);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Prefix shared by all of a user's index entries.
#[must_use]
pub fn user_transactions_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Smallest key sorting after every index entry of the user.
#[must_use]
pub fn user_transactions_upper_bound(user_id: &UserId) -> Vec<u8> {
    let mut key = user_transactions_prefix(user_id);
    key.extend_from_slice(&[0xFF; TRANSACTION_ID_LEN + 1]);
    key
}

/// Extract the transaction ID from a user-transaction index key.
///
/// Returns `None` if the key is not a full index key.
#[must_use]
pub fn extract_transaction_id_from_user_key(key: &[u8]) -> Option<TransactionId> {
    let bytes: [u8; TRANSACTION_ID_LEN] = key
        .get(USER_ID_LEN..USER_ID_LEN + TRANSACTION_ID_LEN)?
        .try_into()
        .ok()?;
    Some(TransactionId::from_bytes(bytes))
}

/// Idempotency key: `user_id (16) || key bytes`.
#[must_use]
pub fn idempotency_key(user_id: &UserId, key: &str) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(USER_ID_LEN + key.len());
    encoded.extend_from_slice(user_id.as_bytes());
    encoded.extend_from_slice(key.as_bytes());
    encoded
}
