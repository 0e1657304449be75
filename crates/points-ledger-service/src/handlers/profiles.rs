//! Profile side-table handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use points_ledger_core::{LedgerError, Profile};

use super::parse_user_id;
use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Profile upsert request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    /// The user.
    #[serde(default)]
    pub user_id: String,
    /// Name shown on the leaderboard.
    #[serde(default)]
    pub display_name: String,
    /// Avatar URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Stored profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// Always true.
    pub success: bool,
    /// The user.
    pub user_id: String,
    /// Display name.
    pub display_name: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// When the copy was written.
    pub updated_at: DateTime<Utc>,
}

/// Upsert a display profile.
pub async fn put_profile(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    ApiJson(body): ApiJson<ProfileBody>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user_id = parse_user_id(&body.user_id)?;
    let display_name = body.display_name.trim();
    if display_name.is_empty() {
        return Err(LedgerError::MissingField("displayName").into());
    }
    let avatar_url = body
        .avatar_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());

    let profile = Profile::new(user_id, display_name, avatar_url);
    state.store.put_profile(&profile)?;

    tracing::debug!(
        service = %auth.service_name,
        user_id = %user_id,
        "Profile updated"
    );

    Ok(Json(ProfileResponse {
        success: true,
        user_id: profile.user_id.to_string(),
        display_name: profile.display_name,
        avatar_url: profile.avatar_url,
        updated_at: profile.updated_at,
    }))
}
