//! Block-explorer endpoint configuration
//!
//! Etherscan-compatible explorers (Etherscan, Polygonscan, Arbiscan, ...) share
//! the `module=account` query shape and differ only in base URL.

/// Environment variable holding the explorer API key
pub const API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

/// Environment variable overriding the explorer base URL
pub const BASE_URL_ENV: &str = "ETHERSCAN_BASE_URL";

/// Default explorer base URL
pub const DEFAULT_BASE_URL: &str = "https://api.etherscan.io/api";

/// Static parameters of an explorer endpoint
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Base URL queries are sent to
    pub base_url: &'static str,
    /// `module` parameter for account history queries
    pub module: &'static str,
    /// `sort` parameter; ascending keeps pagination stable
    pub sort: &'static str,
    /// Substring marking a rate-limit rejection in a `status=0` payload
    pub rate_limit_marker: &'static str,
}

/// Etherscan mainnet configuration
pub const ETHERSCAN_MAINNET: ExplorerConfig = ExplorerConfig {
    base_url: DEFAULT_BASE_URL,
    module: "account",
    sort: "asc",
    rate_limit_marker: "rate limit",
};
