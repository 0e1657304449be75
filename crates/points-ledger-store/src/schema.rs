//! Column family layout for the `RocksDB` backend.

/// Column family names.
pub mod cf {
    /// Account records, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Ledger transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by user, keyed by `user_id || transaction_id`. Empty values.
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";

    /// Used idempotency keys, keyed by `user_id || key`. Values list the transaction IDs.
    pub const IDEMPOTENCY_KEYS: &str = "idempotency_keys";

    /// Display profiles, keyed by `user_id`.
    pub const PROFILES: &str = "profiles";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
        cf::IDEMPOTENCY_KEYS,
        cf::PROFILES,
    ]
}
