//! Ledger transaction types.
//!
//! A [`Posting`] describes one intended change to one sub-ledger. Once the store has applied
//! it, the posting becomes an immutable [`LedgerTransaction`] carrying the resulting balance.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::Currency;
use crate::error::{LedgerError, Result};
use crate::{TransactionId, UserId};

/// Metadata keys the ledger itself writes.
pub mod metadata_keys {
    /// Feature that triggered a deduction.
    pub const FEATURE_KEY: &str = "featureKey";

    /// Marks both legs of a points-to-credits conversion.
    pub const CONVERSION: &str = "conversion";

    /// Credits granted by a conversion.
    pub const CREDITS_RECEIVED: &str = "creditsReceived";

    /// Points consumed by a conversion.
    pub const POINTS_CONVERTED: &str = "pointsConverted";

    /// Keys callers may not set through `Credit`.
    pub const RESERVED: &[&str] = &[CONVERSION, CREDITS_RECEIVED, POINTS_CONVERTED, FEATURE_KEY];
}

/// An append-only record of one applied posting.
///
/// Serialized camelCase like the response bodies that carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose account was affected.
    pub user_id: UserId,

    /// The sub-ledger that changed.
    pub currency: Currency,

    /// Kind of event that produced the change.
    pub transaction_type: TransactionType,

    /// Signed change. Positive for credits, negative for deductions.
    pub amount: i64,

    /// Sub-ledger balance right after this transaction.
    pub balance_after: i64,

    /// Human-readable justification.
    pub reason: String,

    /// Loosely-typed context, e.g. `{ "featureKey": "homework" }`.
    pub metadata: serde_json::Value,

    /// When the transaction was applied.
    pub created_at: DateTime<Utc>,
}

/// Kind of ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Generic credit.
    Credit,
    /// Promotional bonus.
    Bonus,
    /// Referral reward.
    Referral,
    /// Daily login reward.
    Login,
    /// Achievement unlocked.
    Achievement,
    /// Task completed.
    Task,
    /// General activity.
    Activity,
    /// Streak maintained.
    Streak,
    /// Goal reached.
    Goal,
    /// Quiz completed.
    Quiz,
    /// Points spent on a feature or converted.
    Deduction,
    /// Generic debit.
    Debit,
}

impl TransactionType {
    /// All transaction types, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Credit,
        Self::Bonus,
        Self::Referral,
        Self::Login,
        Self::Achievement,
        Self::Task,
        Self::Activity,
        Self::Streak,
        Self::Goal,
        Self::Quiz,
        Self::Deduction,
        Self::Debit,
    ];

    /// Wire name of this type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Bonus => "bonus",
            Self::Referral => "referral",
            Self::Login => "login",
            Self::Achievement => "achievement",
            Self::Task => "task",
            Self::Activity => "activity",
            Self::Streak => "streak",
            Self::Goal => "goal",
            Self::Quiz => "quiz",
            Self::Deduction => "deduction",
            Self::Debit => "debit",
        }
    }

    /// Whether this type adds to a balance.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        !self.is_debit()
    }

    /// Whether this type removes from a balance.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Deduction | Self::Debit)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LedgerError::InvalidTransactionType(wanted.to_string()))
    }
}

/// One intended change to one sub-ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    /// Sub-ledger to change.
    pub currency: Currency,
    /// Signed change.
    pub amount: i64,
    /// Recorded transaction type.
    pub transaction_type: TransactionType,
    /// Recorded reason.
    pub reason: String,
    /// Recorded metadata.
    pub metadata: serde_json::Value,
}

impl Posting {
    /// A positive points posting.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` unless `amount` is positive.
    pub fn credit(
        amount: i64,
        transaction_type: TransactionType,
        reason: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Result<Self> {
        Ok(Self {
            currency: Currency::Points,
            amount: positive(amount)?,
            transaction_type,
            reason: reason.into(),
            metadata,
        })
    }

    /// A negative posting of `amount` recorded as a `deduction`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` unless `amount` is positive.
    pub fn deduction(
        currency: Currency,
        amount: i64,
        reason: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Result<Self> {
        Ok(Self {
            currency,
            amount: -positive(amount)?,
            transaction_type: TransactionType::Deduction,
            reason: reason.into(),
            metadata,
        })
    }

    /// Turn an applied posting into its log record.
    #[must_use]
    pub fn into_transaction(
        self,
        id: TransactionId,
        user_id: UserId,
        balance_after: i64,
    ) -> LedgerTransaction {
        LedgerTransaction {
            id,
            user_id,
            currency: self.currency,
            transaction_type: self.transaction_type,
            amount: self.amount,
            balance_after,
            reason: self.reason,
            metadata: self.metadata,
            created_at: Utc::now(),
        }
    }
}

fn positive(amount: i64) -> Result<i64> {
    if amount > 0 {
        Ok(amount)
    } else {
        Err(LedgerError::InvalidAmount(format!(
            "posting amount must be positive, got {amount}"
        )))
    }
}

/// Check caller-supplied metadata before it reaches a posting.
///
/// Accepts an object or null; null becomes an empty object.
///
/// # Errors
///
/// Returns `InvalidMetadata` for non-object values or reserved keys.
pub fn validate_caller_metadata(metadata: Option<serde_json::Value>) -> Result<serde_json::Value> {
    match metadata {
        None | Some(serde_json::Value::Null) => Ok(serde_json::json!({})),
        Some(serde_json::Value::Object(map)) => {
            if let Some(key) = metadata_keys::RESERVED
                .iter()
                .find(|key| map.contains_key(**key))
            {
                return Err(LedgerError::InvalidMetadata(format!(
                    "`{key}` is reserved"
                )));
            }
            Ok(serde_json::Value::Object(map))
        }
        Some(_) => Err(LedgerError::InvalidMetadata(
            "metadata must be a JSON object".into(),
        )),
    }
}
