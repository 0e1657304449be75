//! Core types and utilities for the points ledger.
//!
//! This crate provides the foundational types shared by the store, the service and the client:
//!
//! - **Identifiers**: `UserId`, `TransactionId`
//! - **Accounts**: `Account`, `Currency`, level derivation
//! - **Transactions**: `LedgerTransaction`, `TransactionType`, `Posting`
//! - **Features**: `FeatureCatalog`, `FeatureCost`
//! - **Conversion**: `ConversionPolicy`, `ConversionQuote`
//! - **Profiles**: `Profile` (display side table for the leaderboard)
//!
//! # Currencies
//!
//! An account holds one signed integer per [`Currency`]:
//!
//! - **Points** are earned from learning activity and spent on gated features.
//! - **Credits** are only obtained by converting a block of points at a fixed rate.
//!
//! Every positive points posting also raises the account's XP, which never decreases.
//! The level is derived from XP (`xp / 100 + 1`) and is never stored on its own.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod conversion;
pub mod error;
pub mod features;
pub mod ids;
pub mod profile;
pub mod transaction;

pub use account::{level_for_xp, Account, Currency, XP_PER_LEVEL};
pub use conversion::{
    ConversionPolicy, ConversionQuote, DEFAULT_CONVERSION_RATE, DEFAULT_MINIMUM_CONVERSION_POINTS,
};
pub use error::{LedgerError, Result};
pub use features::{FeatureCatalog, FeatureCost};
pub use ids::{IdError, TransactionId, UserId};
pub use profile::Profile;
pub use transaction::{
    metadata_keys, validate_caller_metadata, LedgerTransaction, Posting, TransactionType,
};
