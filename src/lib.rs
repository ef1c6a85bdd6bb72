//! # Ethereum Transaction Exporter Library
//!
//! Retrieves the complete on-chain transaction history of a single wallet from a
//! rate-limited, paginated block-explorer API (Etherscan-compatible) and exports
//! it as CSV.
//!
//! ## Features
//!
//! - **Four categories**: native, internal, ERC-20 and ERC-721 transfers, fetched concurrently
//! - **Adaptive block windows**: dense block ranges are split until every query stays
//!   below the explorer's per-query result cap, sparse ranges are merged
//! - **Rate Limiting**: one limiter shared by every worker caps queries per second
//! - **Retry**: exponential backoff with jitter for transient failures
//! - **Unified schema**: heterogeneous records normalized into [`TransactionRecord`]
//!
//! ## Quick Start
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
//! let transport = Arc::new(EtherscanHttpClient::with_api_key(Some("KEY".to_string())));
//! let orchestrator = FetchOrchestrator::new(transport, FetchConfig::default());
//!
//! let records = orchestrator.run(&address, BlockRange::default()).await;
//! println!("{} transactions", records.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`address`] - Wallet address validation
//! - [`fetcher`] - Transport capability, page fetching with retry, record normalization
//! - [`downloader`] - Rate limiter, adaptive window fetcher, orchestrator, deduplication
//! - [`output`] - CSV writer for the final record list
//! - [`metrics`] - Request, retry and window counters

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wallet address parsing and validation
pub mod address;

/// CLI command implementations
pub mod cli;

/// Fetch orchestration, rate limiting and deduplication
pub mod downloader;

/// Transport capability, page fetching and normalization
pub mod fetcher;

/// Metrics collection
pub mod metrics;

/// Data output writers
pub mod output;

pub use address::WalletAddress;

/// Lowest block number of the default range
pub const DEFAULT_START_BLOCK: u64 = 0;

/// Highest block number of the default range
pub const DEFAULT_END_BLOCK: u64 = 99_999_999;

/// Transaction category tracked independently by the explorer API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TxCategory {
    /// Plain value transfer (external transaction)
    #[serde(rename = "External (Normal) Transfer")]
    NativeTransfer,
    /// Value moved by contract execution
    #[serde(rename = "Internal Transfer")]
    InternalTransfer,
    /// ERC-20 token transfer
    #[serde(rename = "ERC-20")]
    FungibleTokenTransfer,
    /// ERC-721 token transfer
    #[serde(rename = "ERC-721")]
    NonFungibleTokenTransfer,
}

impl TxCategory {
    /// Every category, in the order workers are spawned
    pub const ALL: [TxCategory; 4] = [
        TxCategory::NativeTransfer,
        TxCategory::InternalTransfer,
        TxCategory::FungibleTokenTransfer,
        TxCategory::NonFungibleTokenTransfer,
    ];

    /// Explorer `action` parameter for this category
    pub fn action(&self) -> &'static str {
        match self {
            TxCategory::NativeTransfer => "txlist",
            TxCategory::InternalTransfer => "txlistinternal",
            TxCategory::FungibleTokenTransfer => "tokentx",
            TxCategory::NonFungibleTokenTransfer => "tokennfttx",
        }
    }

    /// Human-readable label used in exported files
    pub fn label(&self) -> &'static str {
        match self {
            TxCategory::NativeTransfer => "External (Normal) Transfer",
            TxCategory::InternalTransfer => "Internal Transfer",
            TxCategory::FungibleTokenTransfer => "ERC-20",
            TxCategory::NonFungibleTokenTransfer => "ERC-721",
        }
    }
}

impl fmt::Display for TxCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive block-number range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRange {
    /// First block (inclusive)
    pub start: u64,
    /// Last block (inclusive)
    pub end: u64,
}

impl BlockRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: u64, end: u64) -> Result<Self, String> {
        if start > end {
            return Err(format!(
                "Start block ({start}) must be <= end block ({end})"
            ));
        }
        Ok(Self { start, end })
    }

    /// Number of blocks covered
    pub fn block_count(&self) -> u64 {
        self.end - self.start + 1
    }
}

impl Default for BlockRange {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_BLOCK,
            end: DEFAULT_END_BLOCK,
        }
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Deduplication key: (transaction hash, category, token id)
pub type IdentityKey = (String, TxCategory, String);

/// Unified transaction record produced from any upstream category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction hash
    pub transaction_hash: String,
    /// UTC datetime `YYYY-MM-DD HH:MM:SS`, empty when unknown
    pub timestamp: String,
    /// Sender
    pub from_address: String,
    /// Recipient
    pub to_address: String,
    /// Category the record was fetched under
    pub category: TxCategory,
    /// Token contract, empty for native transfers
    pub asset_contract_address: String,
    /// Token symbol, "ETH" for native transfers
    pub asset_symbol: String,
    /// NFT token id, empty for non-NFT transfers
    pub token_id: String,
    /// Value scaled by the asset decimals
    pub amount: String,
    /// Gas fee in ETH, empty when gas fields are missing
    pub gas_fee: String,
}

impl TransactionRecord {
    /// Identity key used for deduplication
    pub fn identity_key(&self) -> IdentityKey {
        (
            self.transaction_hash.clone(),
            self.category,
            self.token_id.clone(),
        )
    }

    /// Validate that the identity-key fields are present
    pub fn validate(&self) -> Result<(), String> {
        if self.transaction_hash.trim().is_empty() {
            return Err("Transaction hash cannot be empty".to_string());
        }
        Ok(())
    }
}
