//! Unit tests for deduplication of merged results

use eth_tx_exporter::downloader::dedupe;
use eth_tx_exporter::fetcher::RecordNormalizer;
use eth_tx_exporter::{TransactionRecord, TxCategory};
use serde_json::json;

fn normalized(raw: serde_json::Value, category: TxCategory) -> TransactionRecord {
    RecordNormalizer::new().normalize(&raw, category).unwrap()
}

#[test]
fn test_overlapping_windows_collapse() {
    let a = normalized(json!({"hash": "0xaaa", "value": "1"}), TxCategory::NativeTransfer);
    let b = normalized(json!({"hash": "0xbbb", "value": "1"}), TxCategory::NativeTransfer);

    let unique = dedupe(vec![a.clone(), b.clone(), a.clone(), b.clone(), a.clone()]);
    assert_eq!(unique, vec![a, b]);
}

#[test]
fn test_nft_batch_transfer_keeps_each_token() {
    let tokens: Vec<TransactionRecord> = ["1", "2", "3"]
        .iter()
        .map(|id| {
            normalized(
                json!({"hash": "0xbatch", "tokenID": id}),
                TxCategory::NonFungibleTokenTransfer,
            )
        })
        .collect();

    let mut input = tokens.clone();
    input.extend(tokens.clone());
    assert_eq!(dedupe(input), tokens);
}

#[test]
fn test_dedupe_is_idempotent() {
    let records = vec![
        normalized(json!({"hash": "0x1"}), TxCategory::NativeTransfer),
        normalized(json!({"hash": "0x1"}), TxCategory::InternalTransfer),
        normalized(json!({"hash": "0x1"}), TxCategory::NativeTransfer),
    ];
    let once = dedupe(records);
    assert_eq!(once.len(), 2);
    assert_eq!(dedupe(once.clone()), once);
}

#[test]
fn test_empty_input() {
    assert!(dedupe(Vec::new()).is_empty());
}
