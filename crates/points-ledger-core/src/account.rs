//! Account types for the points ledger.
//!
//! An account is a set of named sub-ledgers (one signed integer per [`Currency`]) plus the
//! lifetime XP counter. All mutation goes through [`Account::apply_posting`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::transaction::Posting;
use crate::UserId;

/// XP needed to advance one level.
pub const XP_PER_LEVEL: i64 = 100;

/// Derive the level for an XP total.
#[must_use]
pub const fn level_for_xp(xp: i64) -> i64 {
    if xp < 0 {
        1
    } else {
        xp / XP_PER_LEVEL + 1
    }
}

/// A named sub-ledger within an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// Spendable points, earned from activity.
    Points,

    /// Credits, obtained only through conversion.
    Credits,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Points => f.write_str("points"),
            Self::Credits => f.write_str("credits"),
        }
    }
}

/// A ledger account for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The owning user.
    pub user_id: UserId,

    /// Balance per currency. A missing entry reads as zero.
    pub balances: BTreeMap<Currency, i64>,

    /// Lifetime earned points. Never decreases.
    pub xp: i64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a zero-initialised account.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balances: BTreeMap::new(),
            xp: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Balance of one sub-ledger.
    #[must_use]
    pub fn balance_of(&self, currency: Currency) -> i64 {
        self.balances.get(&currency).copied().unwrap_or(0)
    }

    /// Spendable points.
    #[must_use]
    pub fn points(&self) -> i64 {
        self.balance_of(Currency::Points)
    }

    /// Converted credits.
    #[must_use]
    pub fn credits(&self) -> i64 {
        self.balance_of(Currency::Credits)
    }

    /// Current level, always recomputed from XP.
    #[must_use]
    pub const fn level(&self) -> i64 {
        level_for_xp(self.xp)
    }

    /// Check whether a sub-ledger can cover `amount`.
    #[must_use]
    pub fn can_cover(&self, currency: Currency, amount: i64) -> bool {
        self.balance_of(currency) >= amount
    }

    /// Apply one posting and return the resulting sub-balance.
    ///
    /// The account is left untouched when an error is returned.
    ///
    /// # Errors
    ///
    /// - `InsufficientBalance` if the sub-balance would go negative.
    /// - `InvalidAmount` if the posting is zero or would overflow.
    pub fn apply_posting(&mut self, posting: &Posting) -> Result<i64> {
        if posting.amount == 0 {
            return Err(LedgerError::InvalidAmount("posting amount is zero".into()));
        }

        let current = self.balance_of(posting.currency);
        let next = current
            .checked_add(posting.amount)
            .ok_or_else(|| LedgerError::InvalidAmount("balance overflow".into()))?;

        if next < 0 {
            return Err(LedgerError::InsufficientBalance {
                currency: posting.currency,
                current_balance: current,
                required: posting.amount.saturating_neg(),
            });
        }

        let earns_xp = posting.currency == Currency::Points && posting.amount > 0;
        let xp = if earns_xp {
            self.xp
                .checked_add(posting.amount)
                .ok_or_else(|| LedgerError::InvalidAmount("xp overflow".into()))?
        } else {
            self.xp
        };

        self.balances.insert(posting.currency, next);
        self.xp = xp;
        self.updated_at = Utc::now();

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransactionType;

    #[test]
    fn new_account_is_zeroed() {
        let account = Account::new(UserId::generate());
        assert_eq!(account.points(), 0);
        assert_eq!(account.credits(), 0);
        assert_eq!(account.xp, 0);
        assert_eq!(account.level(), 1);
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(115), 2);
        assert_eq!(level_for_xp(250), 3);
    }

    #[test]
    fn points_credit_raises_xp() {
        let mut account = Account::new(UserId::generate());
        let posting =
            Posting::credit(15, TransactionType::Quiz, "quiz", serde_json::Value::Null).unwrap();

        assert_eq!(account.apply_posting(&posting).unwrap(), 15);
        assert_eq!(account.xp, 15);
        assert_eq!(account.level(), 1);
    }

    #[test]
    fn deduction_leaves_xp_alone() {
        let mut account = Account::new(UserId::generate());
        let earn = Posting::credit(120, TransactionType::Task, "task", serde_json::Value::Null);
        let spend = Posting::deduction(Currency::Points, 100, "feature", serde_json::Value::Null);
        account.apply_posting(&earn.unwrap()).unwrap();
        account.apply_posting(&spend.unwrap()).unwrap();

        assert_eq!(account.points(), 20);
        assert_eq!(account.xp, 120);
        assert_eq!(account.level(), 2);
    }

    #[test]
    fn credits_leg_does_not_raise_xp() {
        let mut account = Account::new(UserId::generate());
        let posting = Posting {
            currency: Currency::Credits,
            amount: 100,
            transaction_type: TransactionType::Credit,
            reason: "conversion".into(),
            metadata: serde_json::Value::Null,
        };

        account.apply_posting(&posting).unwrap();
        assert_eq!(account.credits(), 100);
        assert_eq!(account.xp, 0);
    }

    #[test]
    fn overdraw_is_rejected_without_mutation() {
        let mut account = Account::new(UserId::generate());
        account.balances.insert(Currency::Points, 5);
        let before = account.clone();

        let spend = Posting::deduction(Currency::Points, 10, "homework", serde_json::Value::Null);
        let err = account.apply_posting(&spend.unwrap()).unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                currency: Currency::Points,
                current_balance: 5,
                required: 10,
            }
        );
        assert_eq!(err.shortfall(), Some(5));
        assert_eq!(account, before);
    }

    #[test]
    fn overflow_is_rejected() {
        let mut account = Account::new(UserId::generate());
        account.balances.insert(Currency::Points, i64::MAX);

        let bonus = Posting::credit(1, TransactionType::Bonus, "bonus", serde_json::Value::Null);
        let err = account.apply_posting(&bonus.unwrap()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
        assert_eq!(account.points(), i64::MAX);
    }
}
