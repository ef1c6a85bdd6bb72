//! Transport capability and page-level fetching
//!
//! The core never talks HTTP directly: it depends on the [`Transport`] trait,
//! which answers one paginated query for one category and block range.
//! [`etherscan_http::EtherscanHttpClient`] is the production implementation;
//! tests inject scripted transports.

use crate::address::WalletAddress;
use crate::{BlockRange, TxCategory};
use async_trait::async_trait;
use serde_json::Value;

pub mod etherscan_config;
pub mod etherscan_http;
pub mod normalizer;
pub mod page;
pub mod shared_resources;

pub use normalizer::{RecordNormalizer, TokenMetadata, TokenMetadataCache};
pub use page::{PageFetcher, PageOutcome, RetryPolicy};

/// Fetcher errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetcherError {
    /// Connection, timeout or other network failure
    #[error("network error: {0}")]
    NetworkError(String),

    /// Retryable HTTP status (429, 5xx)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Explorer reported its rate limit was exceeded
    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    ParseError(String),

    /// Every attempt for one page failed
    #[error("{category} page {page} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Category being fetched
        category: TxCategory,
        /// Page number that failed
        page: u32,
        /// Total attempts made
        attempts: u32,
        /// Message of the final failure
        last_error: String,
    },
}

impl FetcherError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetcherError::RetriesExhausted { .. })
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// One paginated query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Category selecting the explorer action
    pub category: TxCategory,
    /// Wallet whose history is requested
    pub address: WalletAddress,
    /// Inclusive block range
    pub range: BlockRange,
    /// 1-based page number
    pub page: u32,
    /// Records per page
    pub page_size: u32,
}

/// Payload status reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Query succeeded, `result` carries records
    Success,
    /// Nothing (more) to return, or a non-success payload
    NoData,
}

/// Raw answer to one [`PageRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    /// Payload status
    pub status: QueryStatus,
    /// Loosely-typed result, normally an array of record objects
    pub result: Value,
}

impl QueryResponse {
    /// Successful response carrying `records`
    pub fn success(records: Vec<Value>) -> Self {
        Self {
            status: QueryStatus::Success,
            result: Value::Array(records),
        }
    }

    /// Response with no records
    pub fn no_data() -> Self {
        Self {
            status: QueryStatus::NoData,
            result: Value::Array(Vec::new()),
        }
    }
}

/// Decoded page of upstream records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    /// Records in upstream order
    pub records: Vec<Value>,
    /// Whether a following page may exist (page was full)
    pub has_more: bool,
}

impl RawPage {
    /// Page signalling "no more data"
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a page; `has_more` is implied by page fullness
    pub fn from_records(records: Vec<Value>, page_size: u32) -> Self {
        let has_more = !records.is_empty() && records.len() >= page_size as usize;
        Self { records, has_more }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the page holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Injected capability answering paginated explorer queries
///
/// Implementations return `Ok` with [`QueryStatus::NoData`] for "nothing to
/// return" and reserve `Err` for network and decode failures, which the
/// [`PageFetcher`] retries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one query
    async fn query(&self, request: &PageRequest) -> FetcherResult<QueryResponse>;
}
