//! Fetch configuration constants and the runtime [`FetchConfig`]

use crate::fetcher::page::RetryPolicy;
use std::time::Duration;

/// Queries allowed per rate-limit window.
/// The free explorer tier allows 5/s; 4 leaves headroom for clock skew.
pub const DEFAULT_RATE_LIMIT: u32 = 4;

/// Rolling window the rate limit applies to
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(1);

/// Records requested per page (`offset` parameter)
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Result count at which a block window is considered clipped.
/// Matches the explorer's per-query cap (`page * offset <= 10000`).
pub const DEFAULT_SATURATION_THRESHOLD: usize = 10_000;

/// Maximum number of retries for a failed page
pub const MAX_RETRIES: u32 = 5;

/// Initial backoff delay in milliseconds
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Maximum backoff delay in milliseconds
pub const MAX_BACKOFF_MS: u64 = 16_000;

/// Upper bound of the uniform jitter added to every backoff, in milliseconds
pub const BACKOFF_JITTER_MS: u64 = 500;

/// Runtime configuration for one export run
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Queries per [`RATE_LIMIT_WINDOW`], shared by all categories
    pub rate_limit: u32,
    /// Records per page
    pub page_size: u32,
    /// Window result count that triggers a split
    pub saturation_threshold: usize,
    /// Retry behaviour for individual pages
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            rate_limit: DEFAULT_RATE_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            saturation_threshold: DEFAULT_SATURATION_THRESHOLD,
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchConfig {
    /// Set queries per second
    pub fn with_rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Set records per page
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the saturation threshold
    pub fn with_saturation_threshold(mut self, threshold: usize) -> Self {
        self.saturation_threshold = threshold;
        self
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the maximum number of retries, keeping the other retry settings
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }
}
