//! Ledger domain services.
//!
//! - [`LedgerEngine`]: the only writer of balances, XP and the transaction log.
//! - [`FeatureGate`]: debits a feature's static cost before granting access.
//! - [`Leaderboard`]: read-only XP ranking joined with display profiles.

pub mod engine;
pub mod gate;
pub mod leaderboard;

pub use engine::{
    ConversionOutcome, CreditOutcome, CreditRequest, DebitOutcome, DebitRequest, LedgerEngine,
    TransactionPage, DEFAULT_TRANSACTION_LIMIT, MAX_TRANSACTION_LIMIT,
};
pub use gate::{Affordability, FeatureGate, FeatureUse};
pub use leaderboard::{Leaderboard, LeaderboardEntry, DEFAULT_LEADERBOARD_LIMIT};
