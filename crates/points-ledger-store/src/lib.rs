//! Storage layer for the points ledger.
//!
//! This crate provides the Balance Store, the append-only Transaction Log, the idempotency
//! index and the profile side table behind one [`Store`] trait.
//!
//! # Backends
//!
//! - [`MemoryStore`]: always available, used by tests and single-process deployments.
//! - `RocksStore` (feature `rocksdb-backend`): persistent, with the column families listed in
//!   [`schema`].
//!
//! # Consistency
//!
//! [`Store::commit`] is the only write path for balances. It runs under a per-user lock,
//! re-reads the account, applies every posting to a copy, and persists the account together
//! with one transaction per posting in a single atomic write. A rejected batch writes nothing.
//!
//! # Example
//!
//! ```
//! use points_ledger_core::{Posting, TransactionType, UserId};
//! use points_ledger_store::{MemoryStore, Store};
//!
//! let store = MemoryStore::new();
//! let user_id = UserId::generate();
//!
//! let posting = Posting::credit(15, TransactionType::Quiz, "quiz", serde_json::json!({}))?;
//! let committed = store.commit(&user_id, vec![posting], None).unwrap();
//! assert_eq!(committed.account.points(), 15);
//! # Ok::<(), points_ledger_core::LedgerError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod locks;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use locks::UserLocks;
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use points_ledger_core::{Account, LedgerTransaction, Posting, Profile, TransactionId, UserId};

/// The result of a committed batch of postings.
#[derive(Debug, Clone)]
pub struct Committed {
    /// The account before the batch.
    pub previous: Account,
    /// The account after the batch.
    pub account: Account,
    /// One transaction per posting, in posting order.
    pub transactions: Vec<LedgerTransaction>,
}

/// The storage trait defining all database operations.
pub trait Store: Send + Sync {
    // =========================================================================
    // Accounts
    // =========================================================================

    /// Get an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>>;

    /// Get an account, creating a zeroed one if absent.
    ///
    /// Creation is serialised with commits for the same user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_or_create_account(&self, user_id: &UserId) -> Result<Account>;

    /// Accounts ordered by XP descending, ties in natural store order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_accounts_by_xp(&self, limit: usize) -> Result<Vec<Account>>;

    // =========================================================================
    // Postings and the transaction log
    // =========================================================================

    /// Apply a batch of postings to one account atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::InsufficientBalance` if any posting would overdraw its sub-ledger.
    /// - `StoreError::DuplicateEvent` if `idempotency_key` was already used by this user.
    /// - `StoreError::InvalidPosting` for an empty batch, zero amounts, or overflow.
    fn commit(
        &self,
        user_id: &UserId,
        postings: Vec<Posting>,
        idempotency_key: Option<&str>,
    ) -> Result<Committed>;

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId)
        -> Result<Option<LedgerTransaction>>;

    /// List transactions for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerTransaction>>;

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Insert or replace a display profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_profile(&self, profile: &Profile) -> Result<()>;

    /// Get a display profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>>;
}

/// Apply postings to a copy of `account` and build the matching log records.
///
/// `last_id` is the newest transaction already logged for the user; new IDs sort after it.
pub(crate) fn apply_postings(
    account: &Account,
    postings: Vec<Posting>,
    last_id: Option<TransactionId>,
) -> Result<(Account, Vec<LedgerTransaction>)> {
    if postings.is_empty() {
        return Err(StoreError::InvalidPosting("empty posting batch".into()));
    }

    let mut next = account.clone();
    let mut transactions = Vec::with_capacity(postings.len());
    let mut previous_id = last_id;

    for posting in postings {
        let balance_after = next.apply_posting(&posting)?;
        let id = TransactionId::generate_after(previous_id);
        previous_id = Some(id);
        transactions.push(posting.into_transaction(id, account.user_id, balance_after));
    }

    Ok((next, transactions))
}
