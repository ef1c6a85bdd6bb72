//! Adaptive block-window fetching for one category
//!
//! The explorer silently truncates any query at its per-query result cap.
//! [`WindowedCategoryFetcher`] pages through a block sub-range, and when the
//! sub-range reaches the saturation threshold it halves the window and
//! re-fetches from the same start, down to a single block. Otherwise it keeps
//! the records, advances past the sub-range and doubles the window.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::address::WalletAddress;
use crate::downloader::DownloadError;
use crate::fetcher::{PageFetcher, PageRequest, RecordNormalizer};
use crate::{BlockRange, TransactionRecord, TxCategory};

/// Outcome of one category run
#[derive(Debug)]
pub struct CategoryReport {
    /// Category fetched
    pub category: TxCategory,
    /// Normalized records, in block order
    pub records: Vec<TransactionRecord>,
    /// Pages successfully fetched, clipped windows included
    pub pages_requested: u32,
    /// Windows accepted
    pub windows_completed: u32,
    /// Times the window was halved
    pub window_shrinks: u32,
    /// Terminal failure; `records` then holds everything fetched before it
    pub failure: Option<DownloadError>,
}

impl CategoryReport {
    fn new(category: TxCategory) -> Self {
        Self {
            category,
            records: Vec::new(),
            pages_requested: 0,
            windows_completed: 0,
            window_shrinks: 0,
            failure: None,
        }
    }

    /// Whether the category ran to the end of its range
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Paginated records of one sub-range
struct WindowFetch {
    records: Vec<Value>,
    saturated: bool,
}

/// Drives the adaptive window algorithm for a single category
///
/// Internally sequential: pages are fetched in order and sub-ranges are
/// processed strictly left to right.
pub struct WindowedCategoryFetcher {
    category: TxCategory,
    address: WalletAddress,
    pages: Arc<PageFetcher>,
    normalizer: Arc<RecordNormalizer>,
    page_size: u32,
    saturation_threshold: usize,
}

impl WindowedCategoryFetcher {
    /// Create a fetcher
    ///
    /// # Arguments
    /// * `category` - Category to fetch
    /// * `address` - Wallet whose history is fetched
    /// * `pages` - Page fetcher shared with the other categories
    /// * `normalizer` - Record normalizer shared with the other categories
    /// * `page_size` - Records per page
    /// * `saturation_threshold` - Sub-range record count treated as clipped
    pub fn new(
        category: TxCategory,
        address: WalletAddress,
        pages: Arc<PageFetcher>,
        normalizer: Arc<RecordNormalizer>,
        page_size: u32,
        saturation_threshold: usize,
    ) -> Self {
        Self {
            category,
            address,
            pages,
            normalizer,
            page_size: page_size.max(1),
            saturation_threshold: saturation_threshold.max(1),
        }
    }

    /// Category this fetcher covers
    pub fn category(&self) -> TxCategory {
        self.category
    }

    /// Fetch every record of the category within `range`
    ///
    /// Never returns an error: a page that exhausts its retries ends the run
    /// and is reported in [`CategoryReport::failure`] alongside the records
    /// gathered until then.
    pub async fn run(&self, range: BlockRange) -> CategoryReport {
        let mut report = CategoryReport::new(self.category);
        let global_end = range.end;
        let mut current_start = range.start;
        let mut window_size = range.end.saturating_sub(range.start);
        let mut current_end = range.end;

        info!(
            category = %self.category,
            start_block = range.start,
            end_block = range.end,
            "Fetching category"
        );

        loop {
            let sub_range = BlockRange {
                start: current_start,
                end: current_end.min(global_end),
            };

            debug!(
                category = %self.category,
                start_block = sub_range.start,
                end_block = sub_range.end,
                window_size,
                "Fetching block window"
            );

            let fetch = match self.fetch_window(sub_range, &mut report).await {
                Ok(fetch) => fetch,
                Err((partial, failure)) => {
                    self.accept(partial, &mut report);
                    error!(
                        category = %self.category,
                        records = report.records.len(),
                        "Category stopped early: {}",
                        failure
                    );
                    report.failure = Some(failure);
                    return report;
                }
            };

            let span = sub_range.end.saturating_sub(sub_range.start);
            if fetch.saturated {
                if span > 0 {
                    window_size = span / 2;
                    current_end = current_start.saturating_add(window_size);
                    report.window_shrinks += 1;
                    crate::metrics::record_window_shrink(self.category);
                    info!(
                        category = %self.category,
                        start_block = current_start,
                        "High density - shrinking block window to {}",
                        window_size
                    );
                    continue;
                }
                warn!(
                    category = %self.category,
                    start_block = sub_range.start,
                    end_block = sub_range.end,
                    records = fetch.records.len(),
                    "Single-block window saturated, keeping possibly truncated records"
                );
            }

            self.accept(fetch.records, &mut report);
            report.windows_completed += 1;

            current_start = match sub_range.end.checked_add(1) {
                Some(next) if next <= global_end => next,
                _ => break,
            };
            window_size = window_size
                .saturating_mul(2)
                .max(1)
                .min(global_end - current_start + 1);
            current_end = current_start.saturating_add(window_size);
        }

        info!(
            category = %self.category,
            records = report.records.len(),
            pages = report.pages_requested,
            windows = report.windows_completed,
            shrinks = report.window_shrinks,
            "Category complete"
        );
        report
    }

    /// Page through one sub-range
    ///
    /// Stops as soon as the saturation threshold is reached. On failure the
    /// records paged so far are handed back with the error.
    async fn fetch_window(
        &self,
        sub_range: BlockRange,
        report: &mut CategoryReport,
    ) -> Result<WindowFetch, (Vec<Value>, DownloadError)> {
        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            let request = PageRequest {
                category: self.category,
                address: self.address.clone(),
                range: sub_range,
                page,
                page_size: self.page_size,
            };

            let raw = match self.pages.fetch(&request).await {
                Ok(raw) => raw,
                Err(source) => {
                    return Err((
                        records,
                        DownloadError::CategoryExhausted {
                            category: self.category,
                            range: sub_range,
                            source,
                        },
                    ))
                }
            };
            report.pages_requested += 1;

            let has_more = raw.has_more;
            records.extend(raw.records);

            if records.len() >= self.saturation_threshold {
                return Ok(WindowFetch {
                    records,
                    saturated: true,
                });
            }
            if !has_more {
                return Ok(WindowFetch {
                    records,
                    saturated: false,
                });
            }
            page = page.saturating_add(1);
        }
    }

    fn accept(&self, raw: Vec<Value>, report: &mut CategoryReport) {
        let before = report.records.len();
        report.records.extend(
            raw.iter()
                .filter_map(|tx| self.normalizer.normalize(tx, self.category)),
        );
        crate::metrics::record_records_fetched(self.category, report.records.len() - before);
    }
}
