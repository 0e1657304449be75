//! In-memory storage implementation.
//!
//! State lives behind one `RwLock`; per-user [`UserLocks`] keep a user's read-modify-write
//! sequence serialized while other users proceed.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use points_ledger_core::{Account, LedgerTransaction, Posting, Profile, TransactionId, UserId};

use crate::error::{Result, StoreError};
use crate::locks::UserLocks;
use crate::{apply_postings, Committed, Store};

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<UserId, Account>,
    /// Account creation order, the natural read order for leaderboard ties.
    account_order: Vec<UserId>,
    transactions: HashMap<TransactionId, LedgerTransaction>,
    /// Per-user transaction IDs, oldest first.
    transactions_by_user: HashMap<UserId, Vec<TransactionId>>,
    idempotency_keys: HashMap<(UserId, String), Vec<TransactionId>>,
    profiles: HashMap<UserId, Profile>,
}

impl MemoryState {
    fn insert_account(&mut self, account: Account) {
        if !self.accounts.contains_key(&account.user_id) {
            self.account_order.push(account.user_id);
        }
        self.accounts.insert(account.user_id, account);
    }
}

/// Volatile storage backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    locks: UserLocks,
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>> {
        Ok(self.read()?.accounts.get(user_id).cloned())
    }

    fn get_or_create_account(&self, user_id: &UserId) -> Result<Account> {
        if let Some(account) = self.get_account(user_id)? {
            return Ok(account);
        }

        let _guard = self.locks.lock(user_id);
        let mut state = self.write()?;
        if let Some(account) = state.accounts.get(user_id) {
            return Ok(account.clone());
        }

        let account = Account::new(*user_id);
        state.insert_account(account.clone());
        tracing::debug!(user_id = %user_id, "Account created");
        Ok(account)
    }

    fn list_accounts_by_xp(&self, limit: usize) -> Result<Vec<Account>> {
        let state = self.read()?;
        let mut accounts: Vec<Account> = state
            .account_order
            .iter()
            .filter_map(|id| state.accounts.get(id).cloned())
            .collect();
        // Stable sort keeps creation order among equal XP.
        accounts.sort_by(|a, b| b.xp.cmp(&a.xp));
        accounts.truncate(limit);
        Ok(accounts)
    }

    fn commit(
        &self,
        user_id: &UserId,
        postings: Vec<Posting>,
        idempotency_key: Option<&str>,
    ) -> Result<Committed> {
        let _guard = self.locks.lock(user_id);

        // Read phase: only this user's lock is held, other users keep going.
        let (previous, last_id) = {
            let state = self.read()?;
            if let Some(key) = idempotency_key {
                if state
                    .idempotency_keys
                    .contains_key(&(*user_id, key.to_string()))
                {
                    return Err(StoreError::DuplicateEvent {
                        key: key.to_string(),
                    });
                }
            }
            let previous = state
                .accounts
                .get(user_id)
                .cloned()
                .unwrap_or_else(|| Account::new(*user_id));
            let last_id = state
                .transactions_by_user
                .get(user_id)
                .and_then(|ids| ids.last().copied());
            (previous, last_id)
        };

        let (account, transactions) = apply_postings(&previous, postings, last_id)?;

        // Write phase: everything lands under one write lock.
        let mut state = self.write()?;
        state.insert_account(account.clone());
        let ids: Vec<TransactionId> = transactions.iter().map(|tx| tx.id).collect();
        state
            .transactions_by_user
            .entry(*user_id)
            .or_default()
            .extend(ids.iter().copied());
        for tx in &transactions {
            state.transactions.insert(tx.id, tx.clone());
        }
        if let Some(key) = idempotency_key {
            state
                .idempotency_keys
                .insert((*user_id, key.to_string()), ids);
        }

        Ok(Committed {
            previous,
            account,
            transactions,
        })
    }

    fn get_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<LedgerTransaction>> {
        Ok(self.read()?.transactions.get(transaction_id).cloned())
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerTransaction>> {
        let state = self.read()?;
        let Some(ids) = state.transactions_by_user.get(user_id) else {
            return Ok(Vec::new());
        };

        Ok(ids
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .filter_map(|id| state.transactions.get(id).cloned())
            .collect())
    }

    fn put_profile(&self, profile: &Profile) -> Result<()> {
        self.write()?
            .profiles
            .insert(profile.user_id, profile.clone());
        Ok(())
    }

    fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>> {
        Ok(self.read()?.profiles.get(user_id).cloned())
    }
}
