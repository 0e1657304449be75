//! Balance, credit, debit, conversion and history handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use points_ledger_core::{ConversionPolicy, LedgerTransaction};

use super::parse_user_id;
use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::ledger::{CreditRequest, DebitRequest};
use crate::state::AppState;

/// Request naming a single user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRequest {
    /// The user to read.
    #[serde(default)]
    pub user_id: String,
}

/// Account snapshot.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Always true.
    pub success: bool,
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

/// Read a user's balance, creating a zeroed account on first access.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    ApiJson(body): ApiJson<BalanceRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let user_id = parse_user_id(&body.user_id)?;
    let account = state.engine.get_balance(&user_id)?;

    Ok(Json(BalanceResponse {
        success: true,
        balance: account.points(),
        xp: account.xp,
        level: account.level(),
        credits: account.credits(),
        created_at: account.created_at,
        updated_at: account.updated_at,
    }))
}

/// Credit request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBody {
    /// User being rewarded.
    #[serde(default)]
    pub user_id: String,
    /// Points to award.
    #[serde(default)]
    pub amount: i64,
    /// Human-readable reason.
    #[serde(default)]
    pub reason: String,
    /// Kind of event, e.g. `quiz`.
    #[serde(default)]
    pub transaction_type: String,
    /// Optional caller context.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// Optional per-user deduplication key.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Credit response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditResponse {
    /// Always true.
    pub success: bool,
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

/// Award points.
pub async fn credit(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    ApiJson(body): ApiJson<CreditBody>,
) -> Result<Json<CreditResponse>, ApiError> {
    let user_id = parse_user_id(&body.user_id)?;
    tracing::debug!(
        service = %auth.service_name,
        user_id = %user_id,
        amount = body.amount,
        transaction_type = %body.transaction_type,
        "Processing credit"
    );

    let outcome = state.engine.credit(CreditRequest {
        user_id,
        amount: body.amount,
        reason: body.reason,
        transaction_type: body.transaction_type,
        metadata: body.metadata,
        idempotency_key: body.idempotency_key,
    })?;

    Ok(Json(CreditResponse {
        success: true,
        balance: outcome.balance,
        xp: outcome.xp,
        level: outcome.level,
        previous_balance: outcome.previous_balance,
        transaction_id: outcome.transaction.id.to_string(),
    }))
}

/// Debit request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitBody {
    /// User being charged.
    #[serde(default)]
    pub user_id: String,
    /// Points to spend.
    #[serde(default)]
    pub amount: i64,
    /// Human-readable reason.
    #[serde(default)]
    pub reason: String,
    /// Feature being paid for, if any.
    #[serde(default)]
    pub feature_key: Option<String>,
    /// Optional per-user deduplication key.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Debit response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitResponse {
    /// Always true.
    pub success: bool,
    /// New points balance.
    pub balance: i64,
    /// Balance before the debit.
    pub previous_balance: i64,
    /// Points removed.
    pub deducted: i64,
    /// Recorded transaction.
    pub transaction_id: String,
}

/// Spend points.
pub async fn debit(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    ApiJson(body): ApiJson<DebitBody>,
) -> Result<Json<DebitResponse>, ApiError> {
    let user_id = parse_user_id(&body.user_id)?;
    tracing::debug!(
        service = %auth.service_name,
        user_id = %user_id,
        amount = body.amount,
        feature_key = ?body.feature_key,
        "Processing debit"
    );

    let outcome = state.engine.debit(DebitRequest {
        user_id,
        amount: body.amount,
        reason: body.reason,
        feature_key: body.feature_key,
        idempotency_key: body.idempotency_key,
    })?;

    Ok(Json(DebitResponse {
        success: true,
        balance: outcome.balance,
        previous_balance: outcome.previous_balance,
        deducted: outcome.deducted,
        transaction_id: outcome.transaction.id.to_string(),
    }))
}

/// Conversion request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertBody {
    /// User converting.
    #[serde(default)]
    pub user_id: String,
    /// Points to convert.
    #[serde(default)]
    pub points: i64,
    /// Optional per-user deduplication key.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Conversion response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    /// Always true.
    pub success: bool,
    /// Points removed, including any remainder.
    pub points_deducted: i64,
    /// Credits granted.
    pub credits_added: i64,
    /// New points balance.
    pub new_points_balance: i64,
    /// New credits balance.
    pub new_credits_balance: i64,
    /// Both legs, points first.
    pub transaction_ids: Vec<String>,
}

/// Convert points into credits.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    ApiJson(body): ApiJson<ConvertBody>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let user_id = parse_user_id(&body.user_id)?;
    tracing::debug!(
        service = %auth.service_name,
        user_id = %user_id,
        points = body.points,
        "Processing conversion"
    );

    let outcome = state.engine.convert_points_to_credits(
        &user_id,
        body.points,
        body.idempotency_key.as_deref(),
    )?;

    Ok(Json(ConvertResponse {
        success: true,
        points_deducted: outcome.points_deducted,
        credits_added: outcome.credits_added,
        new_points_balance: outcome.new_points_balance,
        new_credits_balance: outcome.new_credits_balance,
        transaction_ids: outcome
            .transactions
            .iter()
            .map(|tx| tx.id.to_string())
            .collect(),
    }))
}

/// Current conversion settings.
pub async fn conversion_policy(State(state): State<Arc<AppState>>) -> Json<ConversionPolicy> {
    Json(*state.engine.conversion_policy())
}

/// History request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsRequest {
    /// User to list.
    #[serde(default)]
    pub user_id: String,
    /// Page size, default 50, max 100.
    pub limit: Option<usize>,
    /// Rows to skip.
    #[serde(default)]
    pub offset: usize,
}

/// History response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    /// Always true.
    pub success: bool,
    /// Newest first.
    pub transactions: Vec<LedgerTransaction>,
    /// Whether older transactions exist.
    pub has_more: bool,
}

/// List a user's transactions, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    ApiJson(body): ApiJson<TransactionsRequest>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let user_id = parse_user_id(&body.user_id)?;
    let page = state
        .engine
        .list_transactions(&user_id, body.limit, body.offset)?;

    Ok(Json(TransactionsResponse {
        success: true,
        transactions: page.transactions,
        has_more: page.has_more,
    }))
}
