//! Health check handler.

use axum::Json;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Storage backend compiled in: `rocksdb` or `memory`.
    pub storage: &'static str,
}

/// Liveness probe. Touches no state.
pub async fn health() -> Json<HealthResponse> {
    let storage = if cfg!(feature = "rocksdb-backend") {
        "rocksdb"
    } else {
        "memory"
    };

    Json(HealthResponse {
        status: "ok",
        service: "points-ledger",
        version: env!("CARGO_PKG_VERSION"),
        storage,
    })
}
