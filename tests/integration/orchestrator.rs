//! End-to-end tests for concurrent category fetching

use crate::support::{dense_page, native_tx, nft_tx, wallet, ScriptedTransport};
use eth_tx_exporter::downloader::{FetchConfig, FetchOrchestrator};
use eth_tx_exporter::fetcher::{FetcherError, QueryResponse, RetryPolicy};
use eth_tx_exporter::{BlockRange, TxCategory};
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;

fn config() -> FetchConfig {
    FetchConfig::default()
        .with_rate_limit(50)
        .with_retry(RetryPolicy {
            max_retries: 2,
            jitter: Duration::ZERO,
            ..RetryPolicy::default()
        })
}

#[tokio::test(start_paused = true)]
async fn test_single_native_transfer() {
    let transport = ScriptedTransport::new(|request, _| {
        if request.category == TxCategory::NativeTransfer && request.page == 1 {
            return Ok(QueryResponse::success(vec![json!({
                "hash": "0xabc",
                "timeStamp": "0",
                "from": "0xA",
                "to": "0xB",
                "value": "1000000000000000000"
            })]));
        }
        Ok(QueryResponse::no_data())
    });

    let records = FetchOrchestrator::new(transport.clone(), config())
        .run(&wallet(), BlockRange::default())
        .await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.transaction_hash, "0xabc");
    assert_eq!(record.timestamp, "1970-01-01 00:00:00");
    assert_eq!(record.amount, "1.0");
    assert_eq!(record.asset_symbol, "ETH");
    assert_eq!(record.gas_fee, "");

    let categories: HashSet<TxCategory> =
        transport.requests().iter().map(|r| r.category).collect();
    assert_eq!(categories.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_token_transfers_collapse() {
    let transport = ScriptedTransport::new(|request, _| {
        if request.category == TxCategory::FungibleTokenTransfer {
            let tx = json!({
                "hash": "0x1",
                "contractAddress": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                "tokenSymbol": "USDC",
                "value": "5000000000000000000"
            });
            return Ok(QueryResponse::success(vec![tx.clone(), tx]));
        }
        Ok(QueryResponse::no_data())
    });

    let records = FetchOrchestrator::new(transport, config())
        .run(&wallet(), BlockRange::new(0, 100).unwrap())
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].token_id, "");
    assert_eq!(records[0].amount, "5.0");
}

#[tokio::test(start_paused = true)]
async fn test_nft_batch_keeps_each_token() {
    let transport = ScriptedTransport::new(|request, _| {
        if request.category == TxCategory::NonFungibleTokenTransfer {
            return Ok(QueryResponse::success(vec![
                nft_tx("0xbatch", "1"),
                nft_tx("0xbatch", "2"),
            ]));
        }
        Ok(QueryResponse::no_data())
    });

    let records = FetchOrchestrator::new(transport, config())
        .run(&wallet(), BlockRange::new(0, 100).unwrap())
        .await;

    let token_ids: Vec<&str> = records.iter().map(|r| r.token_id.as_str()).collect();
    assert_eq!(token_ids, vec!["1", "2"]);
    assert!(records.iter().all(|r| r.asset_symbol == "CK"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_category_keeps_other_results() {
    let transport = ScriptedTransport::new(|request, _| match request.category {
        TxCategory::NativeTransfer => Ok(QueryResponse::success(vec![
            native_tx("0x1"),
            native_tx("0x2"),
        ])),
        TxCategory::InternalTransfer => {
            Err(FetcherError::NetworkError("connection reset".to_string()))
        }
        _ => Ok(QueryResponse::no_data()),
    });

    let summary = FetchOrchestrator::new(transport.clone(), config())
        .execute(&wallet(), BlockRange::new(0, 100).unwrap())
        .await;

    assert_eq!(summary.records.len(), 2);
    assert_eq!(summary.failed_categories(), vec![TxCategory::InternalTransfer]);
    assert!(summary.lost.is_empty());

    let internal_calls = transport
        .requests()
        .iter()
        .filter(|r| r.category == TxCategory::InternalTransfer)
        .count();
    assert_eq!(internal_calls, 3);
}

#[tokio::test(start_paused = true)]
async fn test_all_categories_failing_yields_empty_result() {
    let transport =
        ScriptedTransport::new(|_, _| Err(FetcherError::HttpError("503".to_string())));

    let summary = FetchOrchestrator::new(transport, config())
        .execute(&wallet(), BlockRange::new(0, 100).unwrap())
        .await;

    assert!(summary.records.is_empty());
    assert_eq!(summary.failed_categories().len(), 4);

    // Categories back off concurrently: 1s + 2s, not four times that
    assert!(summary.elapsed >= Duration::from_secs(3));
    assert!(summary.elapsed < Duration::from_secs(12));
}

#[tokio::test(start_paused = true)]
async fn test_dense_categories_share_rate_limit() {
    let transport = ScriptedTransport::new(|request, _| Ok(dense_page(request, 1)));
    let config = FetchConfig::default()
        .with_rate_limit(4)
        .with_page_size(10)
        .with_saturation_threshold(20);

    let summary = FetchOrchestrator::new(transport.clone(), config)
        .execute(&wallet(), BlockRange::new(0, 59).unwrap())
        .await;

    // One record per block per category, merged
    assert_eq!(summary.records.len(), 240);

    let mut times = transport.dispatch_times();
    times.sort();
    assert!(times.len() > 4);
    for window in times.windows(5) {
        assert!(window[4].duration_since(window[0]) >= Duration::from_secs(1));
    }
}
