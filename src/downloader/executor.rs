//! Fetch orchestration across categories
//!
//! [`FetchOrchestrator`] spawns one [`WindowedCategoryFetcher`] per
//! [`TxCategory`] on a [`JoinSet`], all sharing one [`RateLimiter`] and one
//! [`RecordNormalizer`]. Results are merged in completion order and
//! deduplicated once at the end. A failed category never fails the run.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::address::WalletAddress;
use crate::downloader::config::FetchConfig;
use crate::downloader::dedupe::dedupe;
use crate::downloader::rate_limit::RateLimiter;
use crate::downloader::window::{CategoryReport, WindowedCategoryFetcher};
use crate::downloader::DownloadError;
use crate::fetcher::{PageFetcher, RecordNormalizer, Transport};
use crate::{BlockRange, TransactionRecord, TxCategory};

/// Merged output of one run
#[derive(Debug, Default)]
pub struct FetchSummary {
    /// Deduplicated records of every category
    pub records: Vec<TransactionRecord>,
    /// Per-category reports, records moved out, in completion order
    pub reports: Vec<CategoryReport>,
    /// Categories whose task ended without a report
    pub lost: Vec<DownloadError>,
    /// Wall-clock time of the whole fetch
    pub elapsed: Duration,
}

impl FetchSummary {
    /// Reports of categories that stopped early
    pub fn failed_categories(&self) -> Vec<TxCategory> {
        self.reports
            .iter()
            .filter(|r| !r.is_complete())
            .map(|r| r.category)
            .collect()
    }
}

/// Runs the four category fetchers concurrently
pub struct FetchOrchestrator {
    pages: Arc<PageFetcher>,
    normalizer: Arc<RecordNormalizer>,
    rate_limiter: Arc<RateLimiter>,
    config: FetchConfig,
}

impl FetchOrchestrator {
    /// Create an orchestrator owning the shared rate limiter and normalizer
    pub fn new(transport: Arc<dyn Transport>, config: FetchConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiter::per_second(config.rate_limit));
        let pages = Arc::new(PageFetcher::new(
            transport,
            Arc::clone(&rate_limiter),
            config.retry.clone(),
        ));
        Self {
            pages,
            normalizer: Arc::new(RecordNormalizer::new()),
            rate_limiter,
            config,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Rate limiter shared by every worker
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Fetch, merge and deduplicate every category
    pub async fn run(&self, address: &WalletAddress, range: BlockRange) -> Vec<TransactionRecord> {
        self.execute(address, range).await.records
    }

    /// Fetch every category and keep the per-category reports
    pub async fn execute(&self, address: &WalletAddress, range: BlockRange) -> FetchSummary {
        info!(
            address = %address,
            start_block = range.start,
            end_block = range.end,
            rate_limit = self.config.rate_limit,
            "Starting concurrent fetch"
        );
        let started = Instant::now();

        let mut tasks = JoinSet::new();
        for category in TxCategory::ALL {
            let fetcher = WindowedCategoryFetcher::new(
                category,
                address.clone(),
                Arc::clone(&self.pages),
                Arc::clone(&self.normalizer),
                self.config.page_size,
                self.config.saturation_threshold,
            );
            tasks.spawn(async move { fetcher.run(range).await });
        }

        let mut merged = Vec::new();
        let mut summary = FetchSummary::default();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(mut report) => {
                    if let Some(failure) = &report.failure {
                        error!(
                            category = %report.category,
                            kept = report.records.len(),
                            "Error in fetch task: {}",
                            failure
                        );
                    }
                    merged.append(&mut report.records);
                    summary.reports.push(report);
                }
                Err(e) => {
                    error!("Error in fetch task: {}", e);
                    summary.lost.push(DownloadError::TaskFailed(e.to_string()));
                }
            }
        }

        let finished: Vec<TxCategory> = summary.reports.iter().map(|r| r.category).collect();
        for category in TxCategory::ALL {
            if !finished.contains(&category) {
                warn!(category = %category, "No results for category");
            }
        }

        let fetched = merged.len();
        summary.records = dedupe(merged);
        summary.elapsed = started.elapsed();
        info!(
            fetched,
            unique = summary.records.len(),
            failed = summary.failed_categories().len() + summary.lost.len(),
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Fetch complete"
        );
        summary
    }
}
