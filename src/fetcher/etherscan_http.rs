//! Etherscan HTTP transport
//!
//! Implements [`Transport`] against the explorer's `module=account` endpoints:
//! - Success payloads (`status == "1"`) carry the record list
//! - Other payloads mean "no data", except rate-limit rejections, which are
//!   raised so the page is retried
//! - HTTP 429 and 5xx are retryable errors; other non-success statuses are
//!   treated as "no data"

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::fetcher::etherscan_config::{ExplorerConfig, ETHERSCAN_MAINNET};
use crate::fetcher::shared_resources::global_http_client;
use crate::fetcher::{FetcherError, FetcherResult, PageRequest, QueryResponse, QueryStatus, Transport};

/// HTTP client for an Etherscan-compatible explorer
pub struct EtherscanHttpClient {
    client: Arc<Client>,
    base_url: String,
    api_key: Option<String>,
    config: ExplorerConfig,
}

impl EtherscanHttpClient {
    /// Create new HTTP client
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client (Arc for cheap cloning)
    /// * `base_url` - Explorer API URL (e.g., "<https://api.etherscan.io/api>")
    /// * `api_key` - Explorer API key, sent as `apikey`
    pub fn new(client: Arc<Client>, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            config: ETHERSCAN_MAINNET,
        }
    }

    /// Mainnet client on the global connection pool
    pub fn with_api_key(api_key: Option<String>) -> Self {
        Self::new(global_http_client(), ETHERSCAN_MAINNET.base_url, api_key)
    }

    /// Base URL queries are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query parameters for one page request
    pub fn build_params(&self, request: &PageRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("module", self.config.module.to_string()),
            ("action", request.category.action().to_string()),
            ("address", request.address.as_str().to_string()),
            ("startblock", request.range.start.to_string()),
            ("endblock", request.range.end.to_string()),
            ("page", request.page.to_string()),
            ("offset", request.page_size.to_string()),
            ("sort", self.config.sort.to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("apikey", key.clone()));
        }
        params
    }

    /// Interpret a decoded `{status, message, result}` envelope
    ///
    /// # Errors
    /// Returns [`FetcherError::RateLimitExceeded`] when a non-success payload
    /// reports a rate-limit rejection
    pub fn parse_envelope(&self, body: Value) -> FetcherResult<QueryResponse> {
        let status = match body.get("status") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let result = body.get("result").cloned().unwrap_or(Value::Null);

        if status == "1" {
            return Ok(QueryResponse {
                status: QueryStatus::Success,
                result,
            });
        }

        if let Value::String(reason) = &result {
            if reason.to_lowercase().contains(self.config.rate_limit_marker) {
                return Err(FetcherError::RateLimitExceeded(reason.clone()));
            }
        }

        let message = body.get("message").and_then(Value::as_str).unwrap_or("");
        debug!(status = %status, message = %message, "No more data or error payload");
        Ok(QueryResponse::no_data())
    }
}

#[async_trait]
impl Transport for EtherscanHttpClient {
    async fn query(&self, request: &PageRequest) -> FetcherResult<QueryResponse> {
        let params = self.build_params(request);

        debug!(
            action = request.category.action(),
            start_block = request.range.start,
            end_block = request.range.end,
            page = request.page,
            "Making GET request to: {}",
            self.base_url
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| FetcherError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 429 {
            return Err(FetcherError::RateLimitExceeded("HTTP 429".to_string()));
        }

        if status.is_server_error() {
            return Err(FetcherError::HttpError(format!("Server error: {status}")));
        }

        if !status.is_success() {
            warn!(
                action = request.category.action(),
                status = status.as_u16(),
                "Non-success HTTP status treated as no data"
            );
            return Ok(QueryResponse::no_data());
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetcherError::ParseError(format!("Failed to deserialize response: {e}")))?;

        self.parse_envelope(body)
    }
}
