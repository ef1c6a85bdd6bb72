//! Raw explorer record normalization
//!
//! Maps one loosely-typed record from any category into a [`TransactionRecord`].
//! Every field conversion is total: malformed inputs produce empty strings or
//! `"0"`, never an error.

use chrono::DateTime;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::{TransactionRecord, TxCategory};

/// Decimals assumed for every asset until on-chain resolution exists
pub const DEFAULT_DECIMALS: u32 = 18;

/// Symbol of the native asset
pub const NATIVE_SYMBOL: &str = "ETH";

const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

/// Resolved token metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    /// Decimal places of the smallest unit
    pub decimals: u32,
    /// Token symbol, empty when unknown
    pub symbol: String,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            decimals: DEFAULT_DECIMALS,
            symbol: String::new(),
        }
    }
}

/// Process-lifetime cache of token metadata keyed by contract address
///
/// Resolution is currently a pure function returning 18 decimals and an empty
/// symbol for every address.
#[derive(Debug, Default)]
pub struct TokenMetadataCache {
    entries: Mutex<HashMap<String, TokenMetadata>>,
}

impl TokenMetadataCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata for `contract_address`; the empty address is the native asset
    pub fn resolve(&self, contract_address: &str) -> TokenMetadata {
        if contract_address.is_empty() {
            return TokenMetadata::default();
        }

        let key = contract_address.to_lowercase();
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .entry(key)
            .or_insert_with(TokenMetadata::default)
            .clone()
    }

    /// Number of cached contracts
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Converts raw explorer records into [`TransactionRecord`]s
#[derive(Debug, Default)]
pub struct RecordNormalizer {
    metadata: TokenMetadataCache,
}

impl RecordNormalizer {
    /// Create a normalizer with an empty metadata cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata cache owned by this normalizer
    pub fn metadata(&self) -> &TokenMetadataCache {
        &self.metadata
    }

    /// Normalize one raw record
    ///
    /// # Returns
    /// `None` (with a warning) when `raw` is not a JSON object
    pub fn normalize(&self, raw: &Value, category: TxCategory) -> Option<TransactionRecord> {
        let Some(tx) = raw.as_object() else {
            warn!(category = %category, record = %raw, "Skipping invalid transaction");
            return None;
        };

        let contract = field(tx, "contractAddress").unwrap_or_default();
        let metadata = self.metadata.resolve(&contract);

        let token_id = non_empty_field(tx, &["tokenID", "tokenId"]).unwrap_or_default();

        let asset_symbol = non_empty_field(tx, &["tokenSymbol"])
            .or_else(|| Some(metadata.symbol.clone()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| {
                if category == TxCategory::NativeTransfer {
                    NATIVE_SYMBOL.to_string()
                } else {
                    String::new()
                }
            });

        Some(TransactionRecord {
            transaction_hash: field(tx, "hash").unwrap_or_default(),
            timestamp: format_timestamp(field(tx, "timeStamp").as_deref()),
            from_address: field(tx, "from").unwrap_or_default(),
            to_address: field(tx, "to").unwrap_or_default(),
            category,
            asset_contract_address: contract,
            asset_symbol,
            token_id,
            amount: format_units(field(tx, "value").as_deref(), metadata.decimals),
            gas_fee: calculate_gas_fee(tx),
        })
    }
}

/// Read `key` as a string; numbers are rendered, other types are absent
fn field(tx: &Map<String, Value>, key: &str) -> Option<String> {
    match tx.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First present, non-empty value among `keys`
fn non_empty_field(tx: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| field(tx, key))
        .find(|value| !value.is_empty())
}

fn is_unsigned_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Format epoch seconds as `YYYY-MM-DD HH:MM:SS` UTC
///
/// Missing or unparseable input yields an empty string.
pub fn format_timestamp(ts: Option<&str>) -> String {
    let Some(ts) = ts.filter(|s| !s.is_empty()) else {
        return String::new();
    };

    let formatted = ts
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string());

    match formatted {
        Some(s) => s,
        None => {
            warn!(timestamp = ts, "Failed to format timestamp");
            String::new()
        }
    }
}

/// Scale an integer string of smallest units by `10^decimals`
///
/// Exact for arbitrarily large values; always renders at least one fractional
/// digit (`"1.0"`). Empty or non-numeric input yields `"0"`.
pub fn format_units(value: Option<&str>, decimals: u32) -> String {
    let Some(value) = value.filter(|v| is_unsigned_integer(v)) else {
        return "0".to_string();
    };

    let digits = value.trim_start_matches('0');
    let decimals = decimals as usize;

    let (integer, fraction) = if digits.len() > decimals {
        let (i, f) = digits.split_at(digits.len() - decimals);
        (i.to_string(), f.to_string())
    } else {
        ("0".to_string(), format!("{digits:0>decimals$}"))
    };

    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{integer}.0")
    } else {
        format!("{integer}.{fraction}")
    }
}

/// Gas fee in ETH: `gasUsed * gasPrice / 1e18`
///
/// Accepts the lower-case aliases `gasused` / `gasprice`. Empty string when
/// either input is missing, non-numeric, or the product overflows.
pub fn calculate_gas_fee(tx: &Map<String, Value>) -> String {
    let gas_used = non_empty_field(tx, &["gasUsed", "gasused"]);
    let gas_price = non_empty_field(tx, &["gasPrice", "gasprice"]);

    let (Some(gas_used), Some(gas_price)) = (gas_used, gas_price) else {
        return String::new();
    };

    if !is_unsigned_integer(&gas_used) || !is_unsigned_integer(&gas_price) {
        debug!(gas_used = %gas_used, gas_price = %gas_price, "Could not calculate gas fee");
        return String::new();
    }

    let fee = Decimal::from_str(&gas_used)
        .ok()
        .zip(Decimal::from_str(&gas_price).ok())
        .and_then(|(used, price)| used.checked_mul(price))
        .and_then(|wei| wei.checked_div(Decimal::from(WEI_PER_ETH)));

    match fee {
        Some(fee) => render_decimal(fee),
        None => {
            debug!(gas_used = %gas_used, gas_price = %gas_price, "Gas fee out of decimal range");
            String::new()
        }
    }
}

fn render_decimal(value: Decimal) -> String {
    let rendered = value.normalize().to_string();
    if rendered.contains('.') {
        rendered
    } else {
        format!("{rendered}.0")
    }
}
