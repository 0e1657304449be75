//! The ledger engine.
//!
//! Every mutation is validated up front, then handed to [`Store::commit`] as a batch of
//! postings. The store re-reads the account under the user's lock, so decisions are never
//! made on a stale balance.

use std::sync::Arc;

use points_ledger_core::{
    metadata_keys, validate_caller_metadata, Account, ConversionPolicy, Currency, LedgerError,
    LedgerTransaction, Posting, Result, TransactionType, UserId,
};
use points_ledger_store::{Committed, Store};

/// Default page size for transaction history.
pub const DEFAULT_TRANSACTION_LIMIT: usize = 50;

/// Largest page size for transaction history.
pub const MAX_TRANSACTION_LIMIT: usize = 100;

/// Input for [`LedgerEngine::credit`].
#[derive(Debug, Clone)]
pub struct CreditRequest {
    /// Account to credit.
    pub user_id: UserId,
    /// Points to add. Must be positive.
    pub amount: i64,
    /// Why the points were awarded.
    pub reason: String,
    /// Wire name of the transaction type (e.g. `"quiz"`).
    pub transaction_type: String,
    /// Optional caller metadata (JSON object).
    pub metadata: Option<serde_json::Value>,
    /// Optional caller-supplied deduplication key.
    pub idempotency_key: Option<String>,
}

/// Result of a successful credit.
#[derive(Debug, Clone)]
pub struct CreditOutcome {
    /// Points balance after the credit.
    pub balance: i64,
    /// XP after the credit.
    pub xp: i64,
    /// Level after the credit.
    pub level: i64,
    /// Points balance before the credit.
    pub previous_balance: i64,
    /// The logged transaction.
    pub transaction: LedgerTransaction,
}

/// Input for [`LedgerEngine::debit`].
#[derive(Debug, Clone)]
pub struct DebitRequest {
    /// Account to debit.
    pub user_id: UserId,
    /// Points to remove. Must be positive.
    pub amount: i64,
    /// Why the points were spent.
    pub reason: String,
    /// Feature the points were spent on, if any.
    pub feature_key: Option<String>,
    /// Optional caller-supplied deduplication key.
    pub idempotency_key: Option<String>,
}

/// Result of a successful debit.
#[derive(Debug, Clone)]
pub struct DebitOutcome {
    /// Points balance after the debit.
    pub balance: i64,
    /// Points balance before the debit.
    pub previous_balance: i64,
    /// Points removed.
    pub deducted: i64,
    /// The logged transaction.
    pub transaction: LedgerTransaction,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    /// Points removed, including any remainder.
    pub points_deducted: i64,
    /// Credits added.
    pub credits_added: i64,
    /// Points balance afterwards.
    pub new_points_balance: i64,
    /// Credits balance afterwards.
    pub new_credits_balance: i64,
    /// The points leg and the credits leg, in that order.
    pub transactions: Vec<LedgerTransaction>,
}

/// One page of transaction history.
#[derive(Debug, Clone)]
pub struct TransactionPage {
    /// Transactions, newest first.
    pub transactions: Vec<LedgerTransaction>,
    /// Whether older transactions exist past this page.
    pub has_more: bool,
}

/// The core ledger service.
#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<dyn Store>,
    conversion: ConversionPolicy,
}

impl LedgerEngine {
    /// Create an engine over a store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, conversion: ConversionPolicy) -> Self {
        Self { store, conversion }
    }

    /// The active conversion policy.
    #[must_use]
    pub const fn conversion_policy(&self) -> &ConversionPolicy {
        &self.conversion
    }

    /// Read an account, creating a zeroed one on first access.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store fails.
    pub fn get_or_create_account(&self, user_id: &UserId) -> Result<Account> {
        self.store
            .get_or_create_account(user_id)
            .map_err(|e| storage_fault("get_or_create_account", user_id, e.into()))
    }

    /// Current account snapshot. Never fails for an unknown user.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store fails.
    pub fn get_balance(&self, user_id: &UserId) -> Result<Account> {
        self.get_or_create_account(user_id)
    }

    /// Read an account without creating it.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store fails.
    pub fn peek_account(&self, user_id: &UserId) -> Result<Option<Account>> {
        self.store
            .get_account(user_id)
            .map_err(|e| storage_fault("get_account", user_id, e.into()))
    }

    /// Award points. XP rises by the same amount.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`.
    /// - `MissingField` if the reason or type is blank.
    /// - `InvalidTransactionType` for unknown or debit-only types.
    /// - `InvalidMetadata` for malformed metadata.
    /// - `DuplicateEvent` for a replayed idempotency key.
    /// - `Storage` if the store fails.
    pub fn credit(&self, request: CreditRequest) -> Result<CreditOutcome> {
        require_positive(request.amount)?;
        let reason = require_text(&request.reason, "reason")?;
        let type_name = require_text(&request.transaction_type, "transactionType")?;
        let transaction_type: TransactionType = type_name.parse()?;
        if !transaction_type.is_credit() {
            return Err(LedgerError::InvalidTransactionType(format!(
                "`{transaction_type}` cannot be used to credit points"
            )));
        }
        let metadata = validate_caller_metadata(request.metadata)?;
        let idempotency_key = normalize_key(request.idempotency_key.as_deref());

        let posting = Posting::credit(request.amount, transaction_type, reason, metadata)?;
        let committed = self.commit(&request.user_id, posting, idempotency_key)?;
        let (previous, account, transaction) = single_leg(committed)?;

        tracing::info!(
            user_id = %request.user_id,
            amount = request.amount,
            transaction_type = %transaction_type,
            new_balance = account.points(),
            xp = account.xp,
            level = account.level(),
            "Points credited"
        );

        Ok(CreditOutcome {
            balance: account.points(),
            xp: account.xp,
            level: account.level(),
            previous_balance: previous.points(),
            transaction,
        })
    }

    /// Spend points. XP and level are untouched.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`.
    /// - `MissingField` if the reason is blank.
    /// - `InsufficientBalance` if the balance is below `amount`; nothing is written.
    /// - `DuplicateEvent` for a replayed idempotency key.
    /// - `Storage` if the store fails.
    pub fn debit(&self, request: DebitRequest) -> Result<DebitOutcome> {
        require_positive(request.amount)?;
        let reason = require_text(&request.reason, "reason")?;
        let feature_key = request
            .feature_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty());
        let metadata = feature_key.map_or_else(
            || serde_json::json!({}),
            |key| {
                let mut fields = serde_json::Map::new();
                fields.insert(metadata_keys::FEATURE_KEY.into(), key.into());
                serde_json::Value::Object(fields)
            },
        );
        let idempotency_key = normalize_key(request.idempotency_key.as_deref());

        let posting = Posting::deduction(Currency::Points, request.amount, reason, metadata)?;
        let committed = match self.commit(&request.user_id, posting, idempotency_key) {
            Ok(committed) => committed,
            Err(err @ LedgerError::InsufficientBalance { .. }) => {
                tracing::info!(
                    user_id = %request.user_id,
                    amount = request.amount,
                    feature_key = ?feature_key,
                    shortfall = ?err.shortfall(),
                    "Debit rejected: insufficient balance"
                );
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        let (previous, account, transaction) = single_leg(committed)?;

        tracing::info!(
            user_id = %request.user_id,
            amount = request.amount,
            feature_key = ?feature_key,
            new_balance = account.points(),
            "Points deducted"
        );

        Ok(DebitOutcome {
            balance: account.points(),
            previous_balance: previous.points(),
            deducted: request.amount,
            transaction,
        })
    }

    /// Convert a block of points into credits at the fixed rate.
    ///
    /// # Errors
    ///
    /// - `BelowMinimumThreshold` if `points` is under the minimum block.
    /// - `InsufficientBalance` if the balance is below `points`; nothing is written.
    /// - `DuplicateEvent` for a replayed idempotency key.
    /// - `Storage` if the store fails.
    pub fn convert_points_to_credits(
        &self,
        user_id: &UserId,
        points: i64,
        idempotency_key: Option<&str>,
    ) -> Result<ConversionOutcome> {
        let quote = self.conversion.quote(points)?;
        let idempotency_key = normalize_key(idempotency_key);

        let committed = self
            .store
            .commit(user_id, Vec::from(quote.postings()), idempotency_key)
            .map_err(|e| classify("commit", user_id, e.into()))?;

        let account = committed.account;
        tracing::info!(
            user_id = %user_id,
            points_deducted = quote.points,
            credits_added = quote.credits,
            remainder = quote.remainder,
            new_points_balance = account.points(),
            new_credits_balance = account.credits(),
            "Points converted to credits"
        );

        Ok(ConversionOutcome {
            points_deducted: quote.points,
            credits_added: quote.credits,
            new_points_balance: account.points(),
            new_credits_balance: account.credits(),
            transactions: committed.transactions,
        })
    }

    /// Transaction history, newest first.
    ///
    /// `limit` defaults to 50 and is capped at 100.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store fails.
    pub fn list_transactions(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<TransactionPage> {
        let limit = limit
            .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
            .min(MAX_TRANSACTION_LIMIT);

        // Fetch one extra row to learn whether another page exists.
        let mut transactions = self
            .store
            .list_transactions_by_user(user_id, limit + 1, offset)
            .map_err(|e| storage_fault("list_transactions_by_user", user_id, e.into()))?;

        let has_more = transactions.len() > limit;
        transactions.truncate(limit);

        Ok(TransactionPage {
            transactions,
            has_more,
        })
    }

    fn commit(
        &self,
        user_id: &UserId,
        posting: Posting,
        idempotency_key: Option<&str>,
    ) -> Result<Committed> {
        self.store
            .commit(user_id, vec![posting], idempotency_key)
            .map_err(|e| classify("commit", user_id, e.into()))
    }
}

fn require_positive(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must be greater than zero, got {amount}"
        )));
    }
    Ok(())
}

fn require_text<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::MissingField(field));
    }
    Ok(trimmed)
}

fn normalize_key(key: Option<&str>) -> Option<&str> {
    key.map(str::trim).filter(|k| !k.is_empty())
}

fn single_leg(committed: Committed) -> Result<(Account, Account, LedgerTransaction)> {
    let Committed {
        previous,
        account,
        transactions,
    } = committed;
    let transaction = transactions
        .into_iter()
        .next()
        .ok_or_else(|| LedgerError::Storage("commit returned no transaction".into()))?;
    Ok((previous, account, transaction))
}

/// Log storage faults loudly; pass rejections through untouched.
fn classify(operation: &'static str, user_id: &UserId, err: LedgerError) -> LedgerError {
    if err.is_rejection() {
        err
    } else {
        storage_fault(operation, user_id, err)
    }
}

fn storage_fault(operation: &'static str, user_id: &UserId, err: LedgerError) -> LedgerError {
    tracing::error!(operation, user_id = %user_id, error = %err, "Ledger storage failure");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use points_ledger_store::MemoryStore;

    fn engine() -> LedgerEngine {
        LedgerEngine::new(Arc::new(MemoryStore::new()), ConversionPolicy::default())
    }

    fn credit_req(user_id: UserId, amount: i64) -> CreditRequest {
        CreditRequest {
            user_id,
            amount,
            reason: "quiz".into(),
            transaction_type: "quiz".into(),
            metadata: None,
            idempotency_key: None,
        }
    }

    fn debit_req(user_id: UserId, amount: i64) -> DebitRequest {
        DebitRequest {
            user_id,
            amount,
            reason: "Homework Helper".into(),
            feature_key: Some("homework".into()),
            idempotency_key: None,
        }
    }

    #[test]
    fn new_user_balance_is_zero() {
        let engine = engine();
        let account = engine.get_balance(&UserId::generate()).unwrap();
        assert_eq!((account.points(), account.xp, account.level()), (0, 0, 1));
    }

    #[test]
    fn balance_reads_are_idempotent() {
        let engine = engine();
        let user = UserId::generate();
        engine.credit(credit_req(user, 30)).unwrap();

        assert_eq!(engine.get_balance(&user).unwrap(), engine.get_balance(&user).unwrap());
    }

    #[test]
    fn credits_accumulate_into_levels() {
        let engine = engine();
        let user = UserId::generate();

        let first = engine.credit(credit_req(user, 15)).unwrap();
        assert_eq!((first.balance, first.xp, first.level), (15, 15, 1));
        assert_eq!(first.previous_balance, 0);

        let mut last = first;
        for _ in 0..9 {
            last = engine.credit(credit_req(user, 10)).unwrap();
        }
        assert_eq!((last.balance, last.xp, last.level), (105, 105, 2));
    }

    #[test]
    fn credit_validation() {
        let engine = engine();
        let user = UserId::generate();

        assert!(matches!(
            engine.credit(credit_req(user, 0)),
            Err(LedgerError::InvalidAmount(_))
        ));

        let mut blank_reason = credit_req(user, 5);
        blank_reason.reason = "  ".into();
        assert_eq!(
            engine.credit(blank_reason).unwrap_err(),
            LedgerError::MissingField("reason")
        );

        let mut blank_type = credit_req(user, 5);
        blank_type.transaction_type = String::new();
        assert_eq!(
            engine.credit(blank_type).unwrap_err(),
            LedgerError::MissingField("transactionType")
        );

        let mut debit_type = credit_req(user, 5);
        debit_type.transaction_type = "deduction".into();
        assert!(matches!(
            engine.credit(debit_type),
            Err(LedgerError::InvalidTransactionType(_))
        ));

        // Nothing was written by any rejected call.
        assert!(engine.peek_account(&user).unwrap().is_none());
    }

    #[test]
    fn debit_spends_without_touching_xp() {
        let engine = engine();
        let user = UserId::generate();
        engine.credit(credit_req(user, 15)).unwrap();

        let outcome = engine.debit(debit_req(user, 10)).unwrap();
        assert_eq!(outcome.balance, 5);
        assert_eq!(outcome.previous_balance, 15);
        assert_eq!(outcome.deducted, 10);
        assert_eq!(outcome.transaction.amount, -10);
        assert_eq!(outcome.transaction.transaction_type, TransactionType::Deduction);
        assert_eq!(outcome.transaction.metadata["featureKey"], "homework");

        let account = engine.get_balance(&user).unwrap();
        assert_eq!(account.xp, 15);
    }

    #[test]
    fn debit_insufficient_balance_changes_nothing() {
        let engine = engine();
        let user = UserId::generate();
        engine.credit(credit_req(user, 15)).unwrap();
        engine.debit(debit_req(user, 10)).unwrap();

        let err = engine.debit(debit_req(user, 10)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                currency: Currency::Points,
                current_balance: 5,
                required: 10,
            }
        );
        assert_eq!(engine.get_balance(&user).unwrap().points(), 5);
        assert_eq!(engine.list_transactions(&user, None, 0).unwrap().transactions.len(), 2);
    }

    #[test]
    fn conversion_rounds_down_and_logs_two_legs() {
        let engine = engine();
        let user = UserId::generate();
        engine.credit(credit_req(user, 6000)).unwrap();

        let outcome = engine.convert_points_to_credits(&user, 5049, None).unwrap();
        assert_eq!(outcome.points_deducted, 5049);
        assert_eq!(outcome.credits_added, 100);
        assert_eq!(outcome.new_points_balance, 951);
        assert_eq!(outcome.new_credits_balance, 100);
        assert_eq!(outcome.transactions.len(), 2);
        assert_eq!(outcome.transactions[0].balance_after, 951);
        assert_eq!(outcome.transactions[1].balance_after, 100);

        // XP is not affected by either leg.
        assert_eq!(engine.get_balance(&user).unwrap().xp, 6000);
    }

    #[test]
    fn conversion_rejections() {
        let engine = engine();
        let user = UserId::generate();
        engine.credit(credit_req(user, 5000)).unwrap();

        assert_eq!(
            engine.convert_points_to_credits(&user, 4999, None).unwrap_err(),
            LedgerError::BelowMinimumThreshold {
                minimum: 5000,
                requested: 4999
            }
        );
        assert!(matches!(
            engine.convert_points_to_credits(&user, 6000, None),
            Err(LedgerError::InsufficientBalance {
                current_balance: 5000,
                required: 6000,
                ..
            })
        ));
        assert_eq!(engine.get_balance(&user).unwrap().points(), 5000);
    }

    #[test]
    fn idempotency_key_blocks_double_award() {
        let engine = engine();
        let user = UserId::generate();
        let mut request = credit_req(user, 10);
        request.transaction_type = "login".into();
        request.idempotency_key = Some("daily-login-2024-05-01".into());

        engine.credit(request.clone()).unwrap();
        assert_eq!(
            engine.credit(request).unwrap_err(),
            LedgerError::DuplicateEvent {
                key: "daily-login-2024-05-01".into()
            }
        );
        assert_eq!(engine.get_balance(&user).unwrap().points(), 10);
    }

    #[test]
    fn audit_log_matches_every_mutation() {
        let engine = engine();
        let user = UserId::generate();

        engine.credit(credit_req(user, 6000)).unwrap();
        engine.debit(debit_req(user, 100)).unwrap();
        let _ = engine.debit(debit_req(user, 1_000_000));
        engine.convert_points_to_credits(&user, 5000, None).unwrap();
        let _ = engine.convert_points_to_credits(&user, 5000, None);

        let page = engine.list_transactions(&user, None, 0).unwrap();
        assert_eq!(page.transactions.len(), 4);
        assert!(!page.has_more);

        let account = engine.get_balance(&user).unwrap();
        let newest_points = page
            .transactions
            .iter()
            .find(|tx| tx.currency == Currency::Points)
            .unwrap();
        assert_eq!(newest_points.balance_after, account.points());
        assert_eq!(page.transactions[0].balance_after, account.credits());
    }

    #[test]
    fn transaction_paging() {
        let engine = engine();
        let user = UserId::generate();
        for _ in 0..5 {
            engine.credit(credit_req(user, 1)).unwrap();
        }

        let page = engine.list_transactions(&user, Some(2), 0).unwrap();
        assert_eq!(page.transactions.len(), 2);
        assert!(page.has_more);

        let last = engine.list_transactions(&user, Some(2), 4).unwrap();
        assert_eq!(last.transactions.len(), 1);
        assert!(!last.has_more);
    }
}
