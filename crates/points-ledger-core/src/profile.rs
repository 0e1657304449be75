//! Display profile side table.
//!
//! Profiles belong to the external profile component; the ledger only keeps a copy so the
//! leaderboard can show names and avatars.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Display details for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// The user.
    pub user_id: UserId,
    /// Name shown on the leaderboard.
    pub display_name: String,
    /// Avatar URL, if any.
    pub avatar_url: Option<String>,
    /// When this copy was last written.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create a profile stamped now.
    #[must_use]
    pub fn new(
        user_id: UserId,
        display_name: impl Into<String>,
        avatar_url: Option<String>,
    ) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            avatar_url,
            updated_at: Utc::now(),
        }
    }
}
