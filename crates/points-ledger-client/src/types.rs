//! Request and response types for the ledger client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use points_ledger_core::{LedgerTransaction, UserId};

/// Request naming a single user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserRequest<'a> {
    pub user_id: &'a UserId,
}

/// Account snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    /// Spendable points.
    pub balance: i64,
    /// Lifetime XP.
    pub xp: i64,
    /// Level derived from XP.
    pub level: i64,
    /// Credits obtained by conversion.
    pub credits: i64,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account last changed.
    pub updated_at: DateTime<Utc>,
}

/// Award points to a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditRequest {
    /// User being rewarded.
    pub user_id: UserId,
    /// Points to award.
    pub amount: i64,
    /// Human-readable reason.
    pub reason: String,
    /// Kind of event, e.g. `quiz` or `login`.
    pub transaction_type: String,
    /// Additional metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Per-user deduplication key for the logical event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl CreditRequest {
    /// A credit without metadata or idempotency key.
    #[must_use]
    pub fn new(
        user_id: UserId,
        amount: i64,
        reason: impl Into<String>,
        transaction_type: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            amount,
            reason: reason.into(),
            transaction_type: transaction_type.into(),
            metadata: None,
            idempotency_key: None,
        }
    }

    /// Deduplicate retries of this event.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Credit response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditResponse {
    /// New points balance.
    pub balance: i64,
    /// New XP.
    pub xp: i64,
    /// New level.
    pub level: i64,
    /// Balance before the credit.
    pub previous_balance: i64,
    /// Recorded transaction.
    pub transaction_id: String,
}

/// Spend a user's points.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitRequest {
    /// User being charged.
    pub user_id: UserId,
    /// Points to spend.
    pub amount: i64,
    /// Human-readable reason.
    pub reason: String,
    /// Feature being paid for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_key: Option<String>,
    /// Per-user deduplication key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Debit response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitResponse {
    /// New points balance.
    pub balance: i64,
    /// Balance before the debit.
    pub previous_balance: i64,
    /// Points removed.
    pub deducted: i64,
    /// Recorded transaction.
    pub transaction_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConvertRequest<'a> {
    pub user_id: &'a UserId,
    pub points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<&'a str>,
}

/// Conversion response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    /// Points removed, including the unconverted remainder.
    pub points_deducted: i64,
    /// Credits granted.
    pub credits_added: i64,
    /// New points balance.
    pub new_points_balance: i64,
    /// New credits balance.
    pub new_credits_balance: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionsRequest<'a> {
    pub user_id: &'a UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    pub offset: usize,
}

/// One page of transaction history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    /// Newest first.
    pub transactions: Vec<LedgerTransaction>,
    /// Whether older transactions exist.
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FeatureRequest<'a> {
    pub user_id: &'a UserId,
    pub feature_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<&'a str>,
}

/// Affordability check response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckFeatureResponse {
    /// Feature checked.
    pub feature_key: String,
    /// Its cost.
    pub cost: i64,
    /// Current balance.
    pub balance: i64,
    /// Whether the balance covers the cost.
    pub can_afford: bool,
    /// Points still missing.
    pub shortfall: i64,
}

/// Granted feature response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseFeatureResponse {
    /// Whether access was granted.
    pub granted: bool,
    /// Feature used.
    pub feature_key: String,
    /// Feature display name.
    pub feature_name: String,
    /// New points balance.
    pub balance: i64,
    /// Balance before the debit.
    pub previous_balance: i64,
    /// Points removed.
    pub deducted: i64,
    /// Recorded transaction.
    pub transaction_id: String,
}

/// One feature cost entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    /// Feature key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Points per use.
    pub cost: i64,
    /// Description.
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FeaturesResponse {
    pub features: Vec<Feature>,
}

/// One leaderboard row.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardEntry {
    /// User ID.
    pub id: String,
    /// 1-based rank.
    pub rank: usize,
    /// Display name.
    pub name: String,
    /// Avatar URL, empty when unknown.
    pub avatar: String,
    /// Lifetime XP.
    pub xp: i64,
    /// Level.
    pub level: i64,
    /// Spendable points.
    pub balance: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error code, e.g. `INSUFFICIENT_BALANCE`.
    pub error: String,
    /// Error message.
    pub message: String,
    /// Code-specific fields.
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl ApiErrorResponse {
    pub(crate) fn detail_i64(&self, key: &str) -> i64 {
        self.details
            .get(key)
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0)
    }
}
