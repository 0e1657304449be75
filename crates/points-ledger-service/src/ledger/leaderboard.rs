//! Leaderboard projection.
//!
//! A read-only ranking by XP. Not authoritative for any balance.

use std::sync::Arc;

use points_ledger_core::{Result, UserId};
use points_ledger_store::Store;

/// Default number of leaderboard rows.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Largest number of leaderboard rows.
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Name shown for users without a profile.
pub const PLACEHOLDER_NAME: &str = "Anonymous Learner";

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// The user.
    pub user_id: UserId,
    /// 1-based position.
    pub rank: usize,
    /// Display name, or the placeholder.
    pub name: String,
    /// Avatar URL, or empty.
    pub avatar: String,
    /// Lifetime XP.
    pub xp: i64,
    /// Level derived from XP.
    pub level: i64,
    /// Spendable points.
    pub balance: i64,
}

/// Builds the ranked view from the balance store and the profile side table.
#[derive(Clone)]
pub struct Leaderboard {
    store: Arc<dyn Store>,
}

impl Leaderboard {
    /// Create a projection over a store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Top accounts by XP. `limit` defaults to 10 and is capped at 100.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the accounts cannot be read. Profile lookups never fail the call.
    pub fn top(&self, limit: Option<usize>) -> Result<Vec<LeaderboardEntry>> {
        let limit = limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .min(MAX_LEADERBOARD_LIMIT);

        let accounts = self.store.list_accounts_by_xp(limit).map_err(|e| {
            tracing::error!(error = %e, "Failed to read accounts for leaderboard");
            points_ledger_core::LedgerError::from(e)
        })?;

        Ok(accounts
            .into_iter()
            .enumerate()
            .map(|(index, account)| {
                let profile = match self.store.get_profile(&account.user_id) {
                    Ok(profile) => profile,
                    Err(e) => {
                        tracing::warn!(
                            user_id = %account.user_id,
                            error = %e,
                            "Profile lookup failed, using placeholder"
                        );
                        None
                    }
                };
                let (name, avatar) = profile.map_or_else(
                    || (PLACEHOLDER_NAME.to_string(), String::new()),
                    |p| (p.display_name, p.avatar_url.unwrap_or_default()),
                );

                LeaderboardEntry {
                    user_id: account.user_id,
                    rank: index + 1,
                    name,
                    avatar,
                    xp: account.xp,
                    level: account.level(),
                    balance: account.points(),
                }
            })
            .collect())
    }
}
