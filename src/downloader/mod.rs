//! Fetch orchestration and rate limiting
//!
//! This module provides the concurrent fetch engine: one adaptive window
//! fetcher per transaction category, all throttled by a single shared
//! rate limiter.
//!
//! # Overview
//!
//! 1. **Configuration**: Defaults and overrides in [`config::FetchConfig`]
//! 2. **Rate Limiting**: Shared throttling via [`rate_limit::RateLimiter`]
//! 3. **Windows**: Per-category adaptive block windows in [`window::WindowedCategoryFetcher`]
//! 4. **Orchestration**: Concurrent categories and merging in [`executor::FetchOrchestrator`]
//! 5. **Deduplication**: Identity-key filtering in [`dedupe::dedupe`]
//!
//! # Quick Start
//!
//! ```no_run
//! use eth_tx_exporter::address::WalletAddress;
//! use eth_tx_exporter::downloader::{FetchConfig, FetchOrchestrator};
//! use eth_tx_exporter::fetcher::etherscan_http::EtherscanHttpClient;
//! use eth_tx_exporter::BlockRange;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let address = WalletAddress::parse("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045")?;
//! let transport = Arc::new(EtherscanHttpClient::with_api_key(None));
//! let config = FetchConfig::default().with_rate_limit(2);
//!
//! let summary = FetchOrchestrator::new(transport, config)
//!     .execute(&address, BlockRange::new(17_000_000, 18_000_000)?)
//!     .await;
//! for report in &summary.reports {
//!     println!("{}: {} pages", report.category, report.pages_requested);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Category failures never abort a run. A page that exhausts its retries
//! ends its category with [`DownloadError::CategoryExhausted`], recorded in
//! the category's report next to the records fetched before it.

pub mod config;
pub mod dedupe;
pub mod executor;
pub mod rate_limit;
pub mod window;

pub use config::FetchConfig;
pub use dedupe::dedupe;
pub use executor::{FetchOrchestrator, FetchSummary};
pub use rate_limit::RateLimiter;
pub use window::{CategoryReport, WindowedCategoryFetcher};

use crate::fetcher::FetcherError;
use crate::{BlockRange, TxCategory};

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// A page of one category failed after every retry
    #[error("{category} fetch stopped in blocks {range}: {source}")]
    CategoryExhausted {
        /// Category that stopped
        category: TxCategory,
        /// Window being paged when the failure happened
        range: BlockRange,
        /// Terminal fetcher error
        #[source]
        source: FetcherError,
    },

    /// A category task panicked or was cancelled
    #[error("fetch task failed: {0}")]
    TaskFailed(String),
}
