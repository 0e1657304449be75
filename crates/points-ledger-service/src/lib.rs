//! Points Ledger HTTP API Service.
//!
//! This crate provides the HTTP API for the points ledger:
//!
//! - Balances, XP and levels
//! - Credits, debits and points-to-credits conversion
//! - Feature gating against a static cost table
//! - Leaderboard projection
//!
//! # Authentication
//!
//! Mutating and per-user routes require the service API key (`x-api-key`). The calling
//! service authenticates end users and passes a trusted `userId`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod ledger;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use ledger::{FeatureGate, Leaderboard, LedgerEngine};
pub use routes::create_router;
pub use state::AppState;
