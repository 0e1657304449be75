//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{features, health, leaderboard, points, profiles};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/points/conversion` - Conversion rate and minimum block
/// - `GET /v1/features` - Feature cost table
/// - `GET /v1/leaderboard` - Top users by XP
///
/// ## Ledger (Service API Key auth)
/// - `POST /v1/points/balance` - Get (or lazily create) an account
/// - `POST /v1/points/credit` - Award points
/// - `POST /v1/points/debit` - Spend points
/// - `POST /v1/points/convert` - Convert points to credits
/// - `POST /v1/points/transactions` - Transaction history
/// - `POST /v1/features/check` - Affordability check
/// - `POST /v1/features/use` - Debit a feature's cost and grant access
/// - `PUT /v1/profiles` - Upsert a leaderboard display profile
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Points
        .route("/v1/points/balance", post(points::get_balance))
        .route("/v1/points/credit", post(points::credit))
        .route("/v1/points/debit", post(points::debit))
        .route("/v1/points/convert", post(points::convert))
        .route("/v1/points/conversion", get(points::conversion_policy))
        .route("/v1/points/transactions", post(points::list_transactions))
        // Features
        .route("/v1/features", get(features::list_features))
        .route("/v1/features/check", post(features::check_feature))
        .route("/v1/features/use", post(features::use_feature))
        // Leaderboard and profiles
        .route("/v1/leaderboard", get(leaderboard::get_leaderboard))
        .route("/v1/profiles", put(profiles::put_profile))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
