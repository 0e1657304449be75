//! Points Ledger Service - HTTP API for points, XP and credits
//!
//! This is the main entry point for the points-ledger service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use points_ledger_service::{create_router, AppState, ServiceConfig};
use points_ledger_store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,points_ledger=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Points Ledger Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        conversion_rate = config.conversion.rate(),
        conversion_minimum = config.conversion.minimum_points(),
        service_auth_configured = config.service_api_key.is_some(),
        "Service configuration loaded"
    );

    let store = open_store(&config)?;

    let state = AppState::new(store, config.clone());

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "rocksdb-backend")]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store = points_ledger_store::RocksStore::open(&config.data_dir)?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "rocksdb-backend"))]
#[allow(clippy::unnecessary_wraps)]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::warn!(
        data_dir = %config.data_dir,
        "Built without rocksdb-backend - using in-memory store, balances are lost on restart"
    );
    Ok(Arc::new(points_ledger_store::MemoryStore::new()))
}
