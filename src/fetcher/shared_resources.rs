//! Process-wide HTTP client
//!
//! The explorer limits requests per API key, so every transport instance shares
//! one connection pool. The rate limiter is owned by the orchestrator instead.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// HTTP connect timeout (seconds) - time to establish TCP connection
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// HTTP request timeout (seconds) - overall time for the entire request
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Global HTTP client shared by all transport instances
///
/// Falls back to an un-tuned client if the builder fails (e.g. TLS backend
/// initialisation), so construction never panics.
pub static GLOBAL_HTTP_CLIENT: Lazy<Arc<Client>> = Lazy::new(|| {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|e| {
            error!("Failed to build HTTP client with timeouts: {}", e);
            Client::new()
        });
    Arc::new(client)
});

/// Get the global HTTP client
pub fn global_http_client() -> Arc<Client> {
    GLOBAL_HTTP_CLIENT.clone()
}
