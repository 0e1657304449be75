//! Points ledger HTTP client implementation.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use points_ledger_core::UserId;

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, BalanceResponse, CheckFeatureResponse, ConvertRequest, ConvertResponse,
    CreditRequest, CreditResponse, DebitRequest, DebitResponse, Feature, FeatureRequest,
    FeaturesResponse, LeaderboardEntry, LeaderboardResponse, TransactionsRequest,
    TransactionsResponse, UseFeatureResponse, UserRequest,
};

/// Points ledger API client.
///
/// Awards and spends points on behalf of an authenticated user.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    client: Client,
    base_url: String,
    api_key: String,
    service_name: String,
}

impl LedgerClient {
    /// Create a new ledger client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the ledger service (e.g., `"http://points-ledger:8080"`)
    /// * `api_key` - Service API key for authentication
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_options(base_url, api_key, ClientOptions::default())
    }

    /// Create a new ledger client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the API key is blank or the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ClientError::Configuration("service API key is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            service_name: options.service_name,
        })
    }

    /// Get a user's balance, XP, level and credits.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_balance(&self, user_id: &UserId) -> Result<BalanceResponse, ClientError> {
        self.post("/v1/points/balance", &UserRequest { user_id })
            .await
    }

    /// Award points.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEvent` for a replayed idempotency key, or an error if the
    /// request fails.
    pub async fn credit(&self, request: CreditRequest) -> Result<CreditResponse, ClientError> {
        self.post("/v1/points/credit", &request).await
    }

    /// Spend points.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` when the user cannot pay, or an error if the
    /// request fails.
    pub async fn debit(&self, request: DebitRequest) -> Result<DebitResponse, ClientError> {
        self.post("/v1/points/debit", &request).await
    }

    /// Convert points into credits.
    ///
    /// # Errors
    ///
    /// Returns `BelowMinimumThreshold` or `InsufficientBalance` on rejection, or an
    /// error if the request fails.
    pub async fn convert(
        &self,
        user_id: &UserId,
        points: i64,
        idempotency_key: Option<&str>,
    ) -> Result<ConvertResponse, ClientError> {
        let request = ConvertRequest {
            user_id,
            points,
            idempotency_key,
        };
        self.post("/v1/points/convert", &request).await
    }

    /// List a user's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_transactions(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<TransactionsResponse, ClientError> {
        let request = TransactionsRequest {
            user_id,
            limit,
            offset,
        };
        self.post("/v1/points/transactions", &request).await
    }

    /// Check whether a user can afford a feature. Writes nothing on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn can_afford(
        &self,
        user_id: &UserId,
        feature_key: &str,
    ) -> Result<CheckFeatureResponse, ClientError> {
        let request = FeatureRequest {
            user_id,
            feature_key,
            idempotency_key: None,
        };
        self.post("/v1/features/check", &request).await
    }

    /// Pay for a feature. Only grant access when this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` when the user cannot pay, or an error if the
    /// request fails.
    pub async fn use_feature(
        &self,
        user_id: &UserId,
        feature_key: &str,
        idempotency_key: Option<&str>,
    ) -> Result<UseFeatureResponse, ClientError> {
        let request = FeatureRequest {
            user_id,
            feature_key,
            idempotency_key,
        };
        self.post("/v1/features/use", &request).await
    }

    /// Top users by XP.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn leaderboard(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, ClientError> {
        let mut url = format!("{}/v1/leaderboard", self.base_url);
        if let Some(limit) = limit {
            url.push_str(&format!("?limit={limit}"));
        }

        let response = self.client.get(&url).send().await?;
        let body: LeaderboardResponse = self.handle_response(response).await?;
        Ok(body.leaderboard)
    }

    /// The feature cost table.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn features(&self) -> Result<Vec<Feature>, ClientError> {
        let url = format!("{}/v1/features", self.base_url);

        let response = self.client.get(&url).send().await?;
        let body: FeaturesResponse = self.handle_response(response).await?;
        Ok(body.features)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }

        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        let Ok(api_error) = error_body else {
            return Err(ClientError::Api {
                code: "UNKNOWN".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            });
        };

        tracing::debug!(
            code = %api_error.error,
            status = status.as_u16(),
            "Ledger request rejected"
        );

        match api_error.error.as_str() {
            "INSUFFICIENT_BALANCE" => Err(ClientError::InsufficientBalance {
                current_balance: api_error.detail_i64("currentBalance"),
                required: api_error.detail_i64("required"),
            }),
            "BELOW_MINIMUM_THRESHOLD" => Err(ClientError::BelowMinimumThreshold {
                minimum: api_error.detail_i64("minimum"),
                requested: api_error.detail_i64("requested"),
            }),
            "DUPLICATE_EVENT" => Err(ClientError::DuplicateEvent {
                idempotency_key: api_error
                    .details
                    .get("idempotencyKey")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }),
            _ => Err(ClientError::Api {
                code: api_error.error,
                message: api_error.message,
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Service name to include in requests.
    pub service_name: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            service_name: "unknown".to_string(),
        }
    }
}

impl ClientOptions {
    /// Create options with a service name.
    #[must_use]
    pub fn with_service_name(name: impl Into<String>) -> Self {
        Self {
            service_name: name.into(),
            ..Self::default()
        }
    }
}
