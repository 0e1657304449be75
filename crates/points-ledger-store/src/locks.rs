//! Per-user write serialization.
//!
//! Every read-modify-write of an account runs while holding that user's stripe. Two users
//! may share a stripe; that only costs parallelism, never correctness.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};

use points_ledger_core::UserId;

/// Default number of lock stripes.
pub const DEFAULT_STRIPES: usize = 64;

/// A fixed table of mutexes indexed by user.
#[derive(Debug)]
pub struct UserLocks {
    stripes: Vec<Mutex<()>>,
}

impl Default for UserLocks {
    fn default() -> Self {
        Self::with_stripes(DEFAULT_STRIPES)
    }
}

impl UserLocks {
    /// Create a table with `count` stripes (at least one).
    #[must_use]
    pub fn with_stripes(count: usize) -> Self {
        Self {
            stripes: (0..count.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Block until this user's stripe is free and hold it for the guard's lifetime.
    pub fn lock(&self, user_id: &UserId) -> MutexGuard<'_, ()> {
        let stripe = &self.stripes[self.stripe_index(user_id)];
        // The guarded value is `()`, so a panic in another writer leaves nothing inconsistent.
        stripe.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stripe_index(&self, user_id: &UserId) -> usize {
        let mut hasher = DefaultHasher::new();
        user_id.hash(&mut hasher);
        #[allow(clippy::cast_possible_truncation)]
        let index = hasher.finish() as usize;
        index % self.stripes.len()
    }
}
