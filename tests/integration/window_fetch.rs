//! Integration tests for the adaptive block-window algorithm

use crate::support::{dense_page, wallet, ScriptedTransport};
use eth_tx_exporter::downloader::{RateLimiter, WindowedCategoryFetcher};
use eth_tx_exporter::fetcher::{PageFetcher, QueryResponse, RecordNormalizer, RetryPolicy};
use eth_tx_exporter::{BlockRange, TxCategory};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn window_fetcher(
    transport: Arc<ScriptedTransport>,
    page_size: u32,
    threshold: usize,
) -> WindowedCategoryFetcher {
    let policy = RetryPolicy {
        max_retries: 1,
        jitter: Duration::ZERO,
        ..RetryPolicy::default()
    };
    let pages = PageFetcher::new(transport, Arc::new(RateLimiter::per_second(1_000)), policy);
    WindowedCategoryFetcher::new(
        TxCategory::NativeTransfer,
        wallet(),
        Arc::new(pages),
        Arc::new(RecordNormalizer::new()),
        page_size,
        threshold,
    )
}

/// Ranges of at least `width` blocks report exactly `threshold` clipped
/// records; narrower ranges report one record per block.
fn capped_transport(width: u64, threshold: usize, page_size: u32) -> Arc<ScriptedTransport> {
    ScriptedTransport::new(move |request, _| {
        if request.range.block_count() >= width {
            let offset = (request.page as usize - 1) * page_size as usize;
            let records: Vec<Value> = (offset..threshold)
                .take(page_size as usize)
                .map(|i| json!({"hash": format!("clipped-{}-{i}", request.range.start)}))
                .collect();
            if records.is_empty() {
                return Ok(QueryResponse::no_data());
            }
            return Ok(QueryResponse::success(records));
        }
        Ok(dense_page(request, 1))
    })
}

#[tokio::test(start_paused = true)]
async fn test_window_converges_below_saturating_width() {
    let (width, threshold, page_size) = (8, 10, 5);
    let transport = capped_transport(width, threshold, page_size);
    let fetcher = window_fetcher(transport.clone(), page_size, threshold);

    let report = fetcher.run(BlockRange::new(0, 99).unwrap()).await;

    assert!(report.is_complete());
    assert!(report.window_shrinks > 0);

    // Nothing from a clipped sub-range survives
    assert!(report
        .records
        .iter()
        .all(|r| !r.transaction_hash.starts_with("clipped")));

    // Every block is covered exactly once, in block order
    let expected: Vec<String> = (0u64..=99).map(|b| format!("0x{b:x}00")).collect();
    let hashes: Vec<String> = report
        .records
        .iter()
        .map(|r| r.transaction_hash.clone())
        .collect();
    assert_eq!(hashes, expected);

    // The window never advances past a saturating sub-range
    let requests = transport.requests();
    for pair in requests.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.range.start > prev.range.start {
            assert!(prev.range.block_count() < width);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_saturated_range_refetches_same_start() {
    let threshold = 4;
    let transport = ScriptedTransport::new(move |request, _| {
        // Dense while the window starts in blocks 0..=3
        if request.range.start <= 3 {
            Ok(dense_page(request, 2))
        } else {
            Ok(QueryResponse::no_data())
        }
    });
    let fetcher = window_fetcher(transport.clone(), 2, threshold);

    let report = fetcher.run(BlockRange::new(0, 1_000).unwrap()).await;

    let requests = transport.requests();
    assert_eq!(requests[0].range, BlockRange::new(0, 1_000).unwrap());
    let second_window = requests
        .iter()
        .find(|r| r.range != requests[0].range)
        .unwrap();
    assert_eq!(second_window.range.start, 0);
    assert_eq!(second_window.page, 1);
    assert!(second_window.range.end < 1_000);

    let unique: HashSet<String> = report
        .records
        .iter()
        .map(|r| r.transaction_hash.clone())
        .collect();
    assert_eq!(unique.len(), report.records.len());
    assert_eq!(report.records.len(), 8);
}

#[tokio::test(start_paused = true)]
async fn test_single_block_over_threshold_still_terminates() {
    let transport = ScriptedTransport::new(|request, _| Ok(dense_page(request, 50)));
    let fetcher = window_fetcher(transport.clone(), 10, 20);

    let report = fetcher.run(BlockRange::new(0, 3).unwrap()).await;

    // Each block saturates on its own and is kept after two pages
    assert!(report.is_complete());
    assert_eq!(report.windows_completed, 4);
    assert_eq!(report.records.len(), 80);

    let ranges: HashSet<BlockRange> = transport.requests().iter().map(|r| r.range).collect();
    for block in 0..=3 {
        assert!(ranges.contains(&BlockRange::new(block, block).unwrap()));
    }
}

#[tokio::test(start_paused = true)]
async fn test_saturated_block_pair_splits_into_single_blocks() {
    // 6 records per block stay under the threshold, any pair reaches it
    let transport = ScriptedTransport::new(|request, _| Ok(dense_page(request, 6)));
    let fetcher = window_fetcher(transport.clone(), 5, 10);

    let report = fetcher.run(BlockRange::new(0, 3).unwrap()).await;

    assert!(report.is_complete());
    assert_eq!(report.windows_completed, 4);
    assert_eq!(report.window_shrinks, 4);

    let expected: Vec<String> = (0u64..=3)
        .flat_map(|b| (0..6).map(move |i| format!("0x{b:x}{i:02}")))
        .collect();
    let hashes: Vec<String> = report
        .records
        .iter()
        .map(|r| r.transaction_hash.clone())
        .collect();
    assert_eq!(hashes, expected);

    let accepted: Vec<BlockRange> = transport
        .requests()
        .iter()
        .filter(|r| r.range.block_count() == 1)
        .map(|r| r.range)
        .collect();
    assert!(accepted.contains(&BlockRange::new(0, 0).unwrap()));
    assert!(accepted.contains(&BlockRange::new(3, 3).unwrap()));
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_accumulated_records() {
    let transport = ScriptedTransport::new(|request, _| {
        if request.range.start == 0 {
            Ok(dense_page(request, 1))
        } else {
            Err(eth_tx_exporter::fetcher::FetcherError::NetworkError(
                "connection reset".to_string(),
            ))
        }
    });
    // Threshold 3 forces [0, 9] to split so a later window fails
    let fetcher = window_fetcher(transport, 5, 3);

    let report = fetcher.run(BlockRange::new(0, 9).unwrap()).await;

    assert!(!report.is_complete());
    assert!(!report.records.is_empty());
    assert!(report.failure.unwrap().to_string().contains("connection reset"));
}

#[tokio::test(start_paused = true)]
async fn test_empty_range_needs_one_query() {
    let transport = ScriptedTransport::empty();
    let fetcher = window_fetcher(transport.clone(), 10, 10);

    let report = fetcher.run(BlockRange::new(0, 1_000).unwrap()).await;

    assert!(report.is_complete());
    assert!(report.records.is_empty());
    assert_eq!(report.windows_completed, 1);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_window_doubles_after_accepted_range() {
    let transport = ScriptedTransport::new(|request, _| Ok(dense_page(request, 1)));
    let fetcher = window_fetcher(transport.clone(), 10, 4);

    let report = fetcher.run(BlockRange::new(0, 20).unwrap()).await;
    assert!(report.is_complete());
    assert_eq!(report.records.len(), 21);

    let ranges: Vec<BlockRange> = transport.requests().iter().map(|r| r.range).collect();
    let accepted = ranges
        .iter()
        .position(|r| *r == BlockRange::new(0, 2).unwrap())
        .unwrap();
    assert_eq!(ranges[accepted + 1], BlockRange::new(3, 7).unwrap());
}
