//! Application state.

use std::sync::Arc;

use points_ledger_store::Store;

use crate::config::ServiceConfig;
use crate::ledger::{FeatureGate, Leaderboard, LedgerEngine};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Balance and transaction log writer.
    pub engine: Arc<LedgerEngine>,

    /// Feature cost gate.
    pub gate: FeatureGate,

    /// XP ranking.
    pub leaderboard: Leaderboard,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let engine = Arc::new(LedgerEngine::new(Arc::clone(&store), config.conversion));
        let catalog = Arc::new(config.load_feature_catalog());
        let gate = FeatureGate::new(Arc::clone(&engine), catalog);
        let leaderboard = Leaderboard::new(Arc::clone(&store));

        if config.service_api_key.is_none() {
            tracing::warn!("SERVICE_API_KEY not set - ledger mutations will be rejected");
        }

        Self {
            store,
            config,
            engine,
            gate,
            leaderboard,
        }
    }
}
