//! Feature gate.
//!
//! Access to a gated feature is granted only after its cost has been debited.

use std::sync::Arc;

use points_ledger_core::{FeatureCatalog, FeatureCost, Result, UserId};

use super::engine::{DebitOutcome, DebitRequest, LedgerEngine};

/// Whether a user can pay for a feature right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affordability {
    /// The feature checked.
    pub feature_key: String,
    /// Its cost in points.
    pub cost: i64,
    /// The user's current points balance.
    pub balance: i64,
}

impl Affordability {
    /// Whether the balance covers the cost.
    #[must_use]
    pub const fn can_afford(&self) -> bool {
        self.balance >= self.cost
    }

    /// Points still missing, zero when affordable.
    #[must_use]
    pub const fn shortfall(&self) -> i64 {
        if self.can_afford() {
            0
        } else {
            self.cost - self.balance
        }
    }
}

/// A granted feature use.
#[derive(Debug, Clone)]
pub struct FeatureUse {
    /// The feature used.
    pub feature_key: String,
    /// Its catalog entry.
    pub feature: FeatureCost,
    /// The debit that paid for it.
    pub debit: DebitOutcome,
}

/// Bridges feature requests to ledger debits.
#[derive(Clone)]
pub struct FeatureGate {
    engine: Arc<LedgerEngine>,
    catalog: Arc<FeatureCatalog>,
}

impl FeatureGate {
    /// Create a gate over an engine and a static catalog.
    #[must_use]
    pub fn new(engine: Arc<LedgerEngine>, catalog: Arc<FeatureCatalog>) -> Self {
        Self { engine, catalog }
    }

    /// The feature cost table.
    #[must_use]
    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    /// Check affordability without writing anything, not even a new account.
    ///
    /// # Errors
    ///
    /// Returns `UnknownFeature` for keys outside the catalog, or `Storage` on store failure.
    pub fn can_afford(&self, user_id: &UserId, feature_key: &str) -> Result<Affordability> {
        let feature = self.catalog.require(feature_key)?;
        let balance = self
            .engine
            .peek_account(user_id)?
            .map_or(0, |account| account.points());

        Ok(Affordability {
            feature_key: feature_key.to_string(),
            cost: feature.cost,
            balance,
        })
    }

    /// Debit the feature's cost, then grant access.
    ///
    /// # Errors
    ///
    /// - `UnknownFeature` for keys outside the catalog.
    /// - `InsufficientBalance`, passed through from the engine with the shortfall.
    /// - `DuplicateEvent` for a replayed idempotency key.
    /// - `Storage` on store failure.
    pub fn use_feature(
        &self,
        user_id: &UserId,
        feature_key: &str,
        idempotency_key: Option<String>,
    ) -> Result<FeatureUse> {
        let feature = self.catalog.require(feature_key)?.clone();

        let debit = self.engine.debit(DebitRequest {
            user_id: *user_id,
            amount: feature.cost,
            reason: feature.description.clone(),
            feature_key: Some(feature_key.to_string()),
            idempotency_key,
        })?;

        tracing::info!(
            user_id = %user_id,
            feature_key,
            cost = feature.cost,
            new_balance = debit.balance,
            "Feature access granted"
        );

        Ok(FeatureUse {
            feature_key: feature_key.to_string(),
            feature,
            debit,
        })
    }
}
