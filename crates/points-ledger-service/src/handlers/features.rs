//! Feature gate handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::parse_user_id;
use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// One feature cost entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureView {
    /// Feature key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Points per use.
    pub cost: i64,
    /// Description.
    pub description: String,
}

/// Feature listing.
#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    /// Features in key order.
    pub features: Vec<FeatureView>,
}

/// List the feature cost table.
pub async fn list_features(State(state): State<Arc<AppState>>) -> Json<FeaturesResponse> {
    let features = state
        .gate
        .catalog()
        .iter()
        .map(|(key, feature)| FeatureView {
            key: key.to_string(),
            name: feature.name.clone(),
            cost: feature.cost,
            description: feature.description.clone(),
        })
        .collect();

    Json(FeaturesResponse { features })
}

/// Feature request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureBody {
    /// The user.
    #[serde(default)]
    pub user_id: String,
    /// The feature.
    #[serde(default)]
    pub feature_key: String,
    /// Optional per-user deduplication key, ignored by checks.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Affordability response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    /// Always true.
    pub success: bool,
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

/// Check whether a user can afford a feature. Writes nothing.
pub async fn check_feature(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    ApiJson(body): ApiJson<FeatureBody>,
) -> Result<Json<CheckResponse>, ApiError> {
    let user_id = parse_user_id(&body.user_id)?;
    let check = state.gate.can_afford(&user_id, body.feature_key.trim())?;

    Ok(Json(CheckResponse {
        success: true,
        can_afford: check.can_afford(),
        shortfall: check.shortfall(),
        feature_key: check.feature_key,
        cost: check.cost,
        balance: check.balance,
    }))
}

/// Granted feature response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UseResponse {
    /// Always true.
    pub success: bool,
    /// Always true; access is only granted after the debit.
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

/// Debit a feature's cost and grant access.
pub async fn use_feature(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    ApiJson(body): ApiJson<FeatureBody>,
) -> Result<Json<UseResponse>, ApiError> {
    let user_id = parse_user_id(&body.user_id)?;
    tracing::debug!(
        service = %auth.service_name,
        user_id = %user_id,
        feature_key = %body.feature_key,
        "Processing feature use"
    );

    let used = state
        .gate
        .use_feature(&user_id, body.feature_key.trim(), body.idempotency_key)?;

    Ok(Json(UseResponse {
        success: true,
        granted: true,
        feature_key: used.feature_key,
        feature_name: used.feature.name,
        balance: used.debit.balance,
        previous_balance: used.debit.previous_balance,
        deducted: used.debit.deducted,
        transaction_id: used.debit.transaction.id.to_string(),
    }))
}
