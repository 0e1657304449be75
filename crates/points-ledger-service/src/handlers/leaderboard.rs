//! Leaderboard handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::state::AppState;

/// Query parameters.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    /// Rows to return, default 10, max 100.
    pub limit: Option<usize>,
}

/// One leaderboard row.
#[derive(Debug, Serialize)]
pub struct LeaderboardRow {
    /// User ID.
    pub id: String,
    /// 1-based rank.
    pub rank: usize,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub avatar: String,
    /// Lifetime XP.
    pub xp: i64,
    /// Level.
    pub level: i64,
    /// Spendable points.
    pub balance: i64,
}

/// Leaderboard response.
#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    /// Always true.
    pub success: bool,
    /// Rows ordered by XP.
    pub leaderboard: Vec<LeaderboardRow>,
}

/// Top users by XP.
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let leaderboard = state
        .leaderboard
        .top(query.limit)?
        .into_iter()
        .map(|entry| LeaderboardRow {
            id: entry.user_id.to_string(),
            rank: entry.rank,
            name: entry.name,
            avatar: entry.avatar,
            xp: entry.xp,
            level: entry.level,
            balance: entry.balance,
        })
        .collect();

    Ok(Json(LeaderboardResponse {
        success: true,
        leaderboard,
    }))
}
