//! Single-page fetching with retry and exponential backoff
//!
//! Every attempt, retries included, first takes a permit from the shared
//! [`RateLimiter`]. Failed attempts back off `initial * 2^n` capped at `max`,
//! plus uniform jitter in `[0, jitter]`.

use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::downloader::config::{BACKOFF_JITTER_MS, INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_RETRIES};
use crate::downloader::rate_limit::RateLimiter;
use crate::fetcher::{
    FetcherError, FetcherResult, PageRequest, QueryResponse, QueryStatus, RawPage, Transport,
};

/// Retry configuration for page requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Ceiling for the exponential part of the delay
    pub max_backoff: Duration,
    /// Upper bound of the random jitter added to every delay
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
            jitter: Duration::from_millis(BACKOFF_JITTER_MS),
        }
    }
}

impl RetryPolicy {
    /// Exponential delay before retry number `retry` (0-based), without jitter
    pub fn base_delay(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Delay before retry number `retry` (0-based), jitter included
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.base_delay(retry);
        if self.jitter.is_zero() {
            return base;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        base + Duration::from_millis(jitter_ms)
    }
}

/// Result of one [`PageFetcher::fetch_traced`] call
#[derive(Debug)]
pub struct PageOutcome {
    /// Decoded page, or the terminal failure once retries are spent
    pub result: FetcherResult<RawPage>,
    /// Backoff delays slept, in order
    pub backoffs: Vec<Duration>,
    /// Transport attempts made
    pub attempts: u32,
}

/// Issues one paginated query with retry
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    rate_limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl PageFetcher {
    /// Create a page fetcher
    ///
    /// # Arguments
    /// * `transport` - Injected query capability
    /// * `rate_limiter` - Limiter shared with every other worker
    /// * `policy` - Retry configuration
    pub fn new(
        transport: Arc<dyn Transport>,
        rate_limiter: Arc<RateLimiter>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            rate_limiter,
            policy,
        }
    }

    /// Retry configuration in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch one page
    ///
    /// # Errors
    /// Returns [`FetcherError::RetriesExhausted`] once every attempt failed
    pub async fn fetch(&self, request: &PageRequest) -> FetcherResult<RawPage> {
        self.fetch_traced(request).await.result
    }

    /// Fetch one page, reporting the backoffs slept along the way
    pub async fn fetch_traced(&self, request: &PageRequest) -> PageOutcome {
        let category = request.category;
        let max_attempts = self.policy.max_retries + 1;
        let mut backoffs = Vec::new();
        let mut last_error = None;

        for attempt in 0..=self.policy.max_retries {
            self.rate_limiter.acquire().await;

            debug!(
                category = %category,
                start_block = request.range.start,
                end_block = request.range.end,
                page = request.page,
                attempt = attempt + 1,
                "Requesting page"
            );

            match self.transport.query(request).await {
                Ok(response) => {
                    crate::metrics::record_request(category, "success");
                    if attempt > 0 {
                        debug!(
                            category = %category,
                            page = request.page,
                            "Retry attempt {}/{} succeeded",
                            attempt + 1,
                            max_attempts
                        );
                    }
                    return PageOutcome {
                        result: Ok(decode_page(response, request.page_size)),
                        backoffs,
                        attempts: attempt + 1,
                    };
                }
                Err(e) => {
                    crate::metrics::record_request(category, "error");
                    let retryable = e.is_retryable();
                    last_error = Some(e);

                    if !retryable || attempt == self.policy.max_retries {
                        break;
                    }

                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        category = %category,
                        page = request.page,
                        "Retrying (attempt {}/{}) after {} - waiting {:.1} seconds...",
                        attempt + 2,
                        max_attempts,
                        last_error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
                        delay.as_secs_f64()
                    );
                    crate::metrics::record_retry_backoff(category, delay);
                    tokio::time::sleep(delay).await;
                    backoffs.push(delay);
                }
            }
        }

        let attempts = backoffs.len() as u32 + 1;
        let last_error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "all retries exhausted".to_string());

        PageOutcome {
            result: Err(FetcherError::RetriesExhausted {
                category,
                page: request.page,
                attempts,
                last_error,
            }),
            backoffs,
            attempts,
        }
    }
}

/// Turn a transport response into a page
///
/// Non-success payloads, non-list results and empty lists all mean
/// "no more data".
fn decode_page(response: QueryResponse, page_size: u32) -> RawPage {
    if response.status == QueryStatus::NoData {
        return RawPage::empty();
    }

    match response.result {
        Value::Array(records) if !records.is_empty() => RawPage::from_records(records, page_size),
        Value::Array(_) => RawPage::empty(),
        other => {
            debug!(result = %other, "Non-list result treated as end of data");
            RawPage::empty()
        }
    }
}
