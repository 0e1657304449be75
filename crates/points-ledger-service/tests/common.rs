//! Common test utilities for points-ledger integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};

use points_ledger_core::UserId;
use points_ledger_service::{create_router, AppState, ServiceConfig};
use points_ledger_store::MemoryStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// A test user ID.
    pub test_user_id: UserId,
    /// The service API key for service-to-service requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    /// Create a harness from a base config; the service key is always set.
    pub fn with_config(config: ServiceConfig) -> Self {
        let service_api_key = "test-service-key".to_string();
        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            service_api_key: Some(service_api_key.clone()),
            ..config
        };

        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            test_user_id: UserId::generate(),
            service_api_key,
        }
    }

    /// POST a JSON body to a service-authenticated route.
    pub async fn post_service(&self, path: &str, body: Value) -> axum_test::TestResponse {
        self.server
            .post(path)
            .add_header("x-api-key", &self.service_api_key)
            .add_header("x-service-name", "learning-app")
            .json(&body)
            .await
    }

    /// Award points to the test user.
    pub async fn credit(&self, amount: i64) -> Value {
        let response = self
            .post_service(
                "/v1/points/credit",
                json!({
                    "userId": self.test_user_id.to_string(),
                    "amount": amount,
                    "reason": "Test funding",
                    "transactionType": "bonus"
                }),
            )
            .await;
        response.assert_status_ok();
        response.json()
    }

    /// Read the test user's balance.
    pub async fn balance(&self) -> Value {
        let response = self
            .post_service(
                "/v1/points/balance",
                json!({ "userId": self.test_user_id.to_string() }),
            )
            .await;
        response.assert_status_ok();
        response.json()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
