//! Service configuration.

use points_ledger_core::{
    ConversionPolicy, FeatureCatalog, DEFAULT_CONVERSION_RATE, DEFAULT_MINIMUM_CONVERSION_POINTS,
};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/points-ledger").
    pub data_dir: String,

    /// Service API key for service-to-service auth.
    pub service_api_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Points-to-credits conversion policy.
    pub conversion: ConversionPolicy,

    /// Optional JSON file overriding the built-in feature cost table.
    pub feature_catalog_path: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/points-ledger".into()),
            service_api_key: std::env::var("SERVICE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS").unwrap_or(30),
            conversion: conversion_policy(
                env_parse("CONVERSION_RATE").unwrap_or(DEFAULT_CONVERSION_RATE),
                env_parse("CONVERSION_MINIMUM_POINTS").unwrap_or(DEFAULT_MINIMUM_CONVERSION_POINTS),
            ),
            feature_catalog_path: std::env::var("FEATURE_CATALOG_PATH").ok(),
        }
    }

    /// Load the feature cost table, falling back to the built-in one.
    #[must_use]
    pub fn load_feature_catalog(&self) -> FeatureCatalog {
        let Some(path) = &self.feature_catalog_path else {
            return FeatureCatalog::default();
        };

        match FeatureCatalog::from_path(path) {
            Ok(catalog) => {
                tracing::info!(path = %path, features = catalog.len(), "Loaded feature catalog");
                catalog
            }
            Err(e) => {
                tracing::warn!(
                    path = %path,
                    error = %e,
                    "Feature catalog unreadable, using built-in table"
                );
                FeatureCatalog::default()
            }
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn conversion_policy(rate: i64, minimum_points: i64) -> ConversionPolicy {
    ConversionPolicy::new(rate, minimum_points).unwrap_or_else(|e| {
        tracing::warn!(
            rate,
            minimum_points,
            error = %e,
            "Invalid conversion settings, using defaults"
        );
        ConversionPolicy::default()
    })
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/points-ledger".into(),
            service_api_key: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            conversion: ConversionPolicy::default(),
            feature_catalog_path: None,
        }
    }
}
