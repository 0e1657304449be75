//! `RocksDB` storage implementation.
//!
//! Values are CBOR-encoded. Every commit is a single `WriteBatch`, so the account, its
//! transactions, the user index and the idempotency marker become visible together or not
//! at all.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use points_ledger_core::{Account, LedgerTransaction, Posting, Profile, TransactionId, UserId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::locks::UserLocks;
use crate::schema::{all_column_families, cf};
use crate::{apply_postings, Committed, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    locks: UserLocks,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            locks: UserLocks::default(),
        })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_value<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Walk a user's index entries from newest to oldest.
    fn newest_transaction_ids(
        &self,
        user_id: &UserId,
        skip: usize,
        take: usize,
    ) -> Result<Vec<TransactionId>> {
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_transactions_prefix(user_id);
        let upper = keys::user_transactions_upper_bound(user_id);

        let iter = self
            .db
            .iterator_cf(&cf_by_user, IteratorMode::From(&upper, Direction::Reverse));

        let mut ids = Vec::with_capacity(take);
        for item in iter.skip(skip) {
            if ids.len() >= take {
                break;
            }
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            let id = keys::extract_transaction_id_from_user_key(&key).ok_or_else(|| {
                StoreError::Database("malformed transactions_by_user key".into())
            })?;
            ids.push(id);
        }
        Ok(ids)
    }
}

impl Store for RocksStore {
    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>> {
        self.get_value(cf::ACCOUNTS, &keys::account_key(user_id))
    }

    fn get_or_create_account(&self, user_id: &UserId) -> Result<Account> {
        if let Some(account) = self.get_account(user_id)? {
            return Ok(account);
        }

        let _guard = self.locks.lock(user_id);
        if let Some(account) = self.get_account(user_id)? {
            return Ok(account);
        }

        let account = Account::new(*user_id);
        let cf = self.cf(cf::ACCOUNTS)?;
        self.db
            .put_cf(&cf, keys::account_key(user_id), Self::serialize(&account)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(user_id = %user_id, "Account created");
        Ok(account)
    }

    fn list_accounts_by_xp(&self, limit: usize) -> Result<Vec<Account>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let mut accounts = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            accounts.push(Self::deserialize::<Account>(&value)?);
        }
        // Stable sort keeps key order among equal XP.
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

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_tx_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let cf_idempotency = self.cf(cf::IDEMPOTENCY_KEYS)?;

        let idempotency_db_key = idempotency_key.map(|key| keys::idempotency_key(user_id, key));
        if let (Some(key), Some(db_key)) = (idempotency_key, &idempotency_db_key) {
            let seen = self
                .db
                .get_cf(&cf_idempotency, db_key)
                .map_err(|e| StoreError::Database(e.to_string()))?
                .is_some();
            if seen {
                return Err(StoreError::DuplicateEvent {
                    key: key.to_string(),
                });
            }
        }

        let previous = self
            .get_account(user_id)?
            .unwrap_or_else(|| Account::new(*user_id));
        let last_id = self.newest_transaction_ids(user_id, 0, 1)?.into_iter().next();

        let (account, transactions) = apply_postings(&previous, postings, last_id)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_accounts,
            keys::account_key(user_id),
            Self::serialize(&account)?,
        );
        for tx in &transactions {
            batch.put_cf(&cf_tx, keys::transaction_key(&tx.id), Self::serialize(tx)?);
            batch.put_cf(&cf_tx_by_user, keys::user_transaction_key(user_id, &tx.id), []);
        }
        if let Some(db_key) = idempotency_db_key {
            let ids: Vec<TransactionId> = transactions.iter().map(|tx| tx.id).collect();
            batch.put_cf(&cf_idempotency, db_key, Self::serialize(&ids)?);
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

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
        self.get_value(cf::TRANSACTIONS, &keys::transaction_key(transaction_id))
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerTransaction>> {
        let mut transactions = Vec::new();
        for id in self.newest_transaction_ids(user_id, offset, limit)? {
            if let Some(tx) = self.get_transaction(&id)? {
                transactions.push(tx);
            }
        }
        Ok(transactions)
    }

    fn put_profile(&self, profile: &Profile) -> Result<()> {
        let cf = self.cf(cf::PROFILES)?;
        self.db
            .put_cf(
                &cf,
                keys::account_key(&profile.user_id),
                Self::serialize(profile)?,
            )
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>> {
        self.get_value(cf::PROFILES, &keys::account_key(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use points_ledger_core::{Currency, TransactionType};

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn credit(amount: i64) -> Posting {
        Posting::credit(amount, TransactionType::Task, "task", serde_json::json!({})).unwrap()
    }

    fn spend(amount: i64) -> Posting {
        Posting::deduction(Currency::Points, amount, "homework", serde_json::json!({})).unwrap()
    }

    #[test]
    fn account_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let user_id = UserId::generate();
        {
            let store = RocksStore::open(dir.path()).unwrap();
            store.commit(&user_id, vec![credit(42)], None).unwrap();
        }

        let store = RocksStore::open(dir.path()).unwrap();
        let account = store.get_account(&user_id).unwrap().unwrap();
        assert_eq!(account.points(), 42);
        assert_eq!(account.xp, 42);
        assert_eq!(store.list_transactions_by_user(&user_id, 10, 0).unwrap().len(), 1);
    }

    #[test]
    fn get_or_create_persists_zero_account() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        let created = store.get_or_create_account(&user_id).unwrap();
        assert_eq!(created.points(), 0);
        assert_eq!(store.get_account(&user_id).unwrap().unwrap(), created);
    }

    #[test]
    fn transactions_newest_first_and_isolated_per_user() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let other = UserId::generate();

        for amount in 1..=3 {
            store.commit(&user_id, vec![credit(amount)], None).unwrap();
        }
        store.commit(&other, vec![credit(99)], None).unwrap();

        let log = store.list_transactions_by_user(&user_id, 10, 0).unwrap();
        let amounts: Vec<i64> = log.iter().map(|tx| tx.amount).collect();
        assert_eq!(amounts, vec![3, 2, 1]);

        let page = store.list_transactions_by_user(&user_id, 1, 1).unwrap();
        assert_eq!(page[0].amount, 2);
    }

    #[test]
    fn conversion_legs_commit_together() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        store.commit(&user_id, vec![credit(6000)], None).unwrap();

        let quote = points_ledger_core::ConversionPolicy::default()
            .quote(5049)
            .unwrap();
        let committed = store
            .commit(&user_id, quote.postings().to_vec(), Some("convert-1"))
            .unwrap();

        assert_eq!(committed.account.points(), 951);
        assert_eq!(committed.account.credits(), 100);
        assert_eq!(committed.transactions[0].balance_after, 951);
        assert_eq!(committed.transactions[1].currency, Currency::Credits);
        assert_eq!(committed.transactions[1].balance_after, 100);

        let replay = store.commit(&user_id, quote.postings().to_vec(), Some("convert-1"));
        assert!(matches!(replay, Err(StoreError::DuplicateEvent { .. })));
    }

    #[test]
    fn insufficient_balance_writes_nothing() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        store.commit(&user_id, vec![credit(5)], None).unwrap();

        let result = store.commit(&user_id, vec![spend(10)], None);
        assert!(matches!(
            result,
            Err(StoreError::InsufficientBalance {
                balance: 5,
                required: 10,
                ..
            })
        ));
        assert_eq!(store.get_account(&user_id).unwrap().unwrap().points(), 5);
        assert_eq!(store.list_transactions_by_user(&user_id, 10, 0).unwrap().len(), 1);
    }

    #[test]
    fn concurrent_debits_cannot_double_spend() {
        let (store, _dir) = create_test_store();
        let store = Arc::new(store);
        let user_id = UserId::generate();
        store.commit(&user_id, vec![credit(10)], None).unwrap();

        let barrier = Arc::new(std::sync::Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    store.commit(&user_id, vec![spend(10)], None)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let rejections = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::InsufficientBalance { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(rejections, 1);
        assert_eq!(store.get_account(&user_id).unwrap().unwrap().points(), 0);
        assert_eq!(store.list_transactions_by_user(&user_id, 10, 0).unwrap().len(), 2);
    }

    #[test]
    fn leaderboard_order_and_profiles() {
        let (store, _dir) = create_test_store();
        let low = UserId::generate();
        let high = UserId::generate();
        store.commit(&low, vec![credit(10)], None).unwrap();
        store.commit(&high, vec![credit(300)], None).unwrap();
        store.put_profile(&Profile::new(high, "Grace", None)).unwrap();

        let ranked = store.list_accounts_by_xp(10).unwrap();
        assert_eq!(ranked[0].user_id, high);
        assert_eq!(ranked[1].user_id, low);
        assert_eq!(store.get_profile(&high).unwrap().unwrap().display_name, "Grace");
        assert!(store.get_profile(&low).unwrap().is_none());
    }
}
