//! Export command implementation

use crate::address::WalletAddress;
use crate::downloader::config::{
    DEFAULT_PAGE_SIZE, DEFAULT_RATE_LIMIT, DEFAULT_SATURATION_THRESHOLD,
};
use crate::downloader::{FetchConfig, FetchOrchestrator};
use crate::fetcher::etherscan_config::{API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL};
use crate::fetcher::etherscan_http::EtherscanHttpClient;
use crate::fetcher::shared_resources::global_http_client;
use crate::fetcher::Transport;
use crate::output::csv::CsvTransactionsWriter;
use crate::output::{OutputWriter, TransactionsWriter};
use crate::{BlockRange, DEFAULT_END_BLOCK, DEFAULT_START_BLOCK};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::CliError;

/// Parse a strictly positive integer
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("value must be at least 1".to_string());
    }
    Ok(value)
}

/// Ethereum wallet transaction exporter
#[derive(Parser, Debug)]
#[command(name = "eth-tx-exporter")]
#[command(about = "Export the full transaction history of an Ethereum wallet to CSV", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Maximum number of retries for failed requests (default: 5, range: 0-20)
    #[arg(long, global = true, default_value = "5", value_parser = clap::value_parser!(u32).range(0..=20))]
    pub max_retries: u32,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Install the Prometheus exporter when `--metrics-addr` is set
    ///
    /// # Returns
    /// Whether an exporter address was configured
    pub async fn start_metrics(&self) -> Result<bool, CliError> {
        let Some(addr) = self.metrics_addr else {
            return Ok(false);
        };
        crate::metrics::init_metrics(addr).await?;
        Ok(true)
    }
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a wallet's transactions to CSV
    Export(ExportArgs),

    /// Validate a wallet address
    Validate(super::ValidateCommand),
}

/// Export command arguments
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Wallet address (0x followed by 40 hex characters)
    pub wallet_address: String,

    /// Explorer API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Explorer API base URL
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Output CSV file
    #[arg(short, long, default_value = "transactions.csv")]
    pub output: PathBuf,

    /// First block to export (inclusive)
    #[arg(long, default_value_t = DEFAULT_START_BLOCK)]
    pub start_block: u64,

    /// Last block to export (inclusive)
    #[arg(long, default_value_t = DEFAULT_END_BLOCK)]
    pub end_block: u64,

    /// Explorer queries per second, shared by all categories
    #[arg(long, default_value_t = DEFAULT_RATE_LIMIT, value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    /// Records per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: u32,

    /// Records per block window treated as clipped by the explorer
    #[arg(long, default_value_t = DEFAULT_SATURATION_THRESHOLD, value_parser = parse_positive_usize)]
    pub saturation_threshold: usize,
}

/// Result of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing to export; no file was written
    NoTransactions,
    /// Records written to `path`
    Written {
        /// Unique records exported
        count: usize,
        /// Destination file
        path: PathBuf,
    },
}

impl ExportArgs {
    /// Fetch configuration from the flags and the global retry limit
    pub fn fetch_config(&self, max_retries: u32) -> FetchConfig {
        FetchConfig::default()
            .with_rate_limit(self.rate_limit)
            .with_page_size(self.page_size)
            .with_saturation_threshold(self.saturation_threshold)
            .with_max_retries(max_retries)
    }

    /// Requested block range
    pub fn block_range(&self) -> Result<BlockRange, CliError> {
        BlockRange::new(self.start_block, self.end_block).map_err(CliError::InvalidArgument)
    }

    /// Execute the export against the configured explorer
    pub async fn execute(&self, cli: &Cli) -> Result<ExportOutcome, CliError> {
        let transport = EtherscanHttpClient::new(
            global_http_client(),
            self.base_url.clone(),
            self.api_key.clone(),
        );
        if self.api_key.is_none() {
            warn!("No API key configured ({} unset), explorer limits will be strict", API_KEY_ENV);
        }
        self.execute_with_transport(cli, Arc::new(transport)).await
    }

    /// Execute the export against an injected transport
    ///
    /// Arguments are validated before any query is issued.
    pub async fn execute_with_transport(
        &self,
        cli: &Cli,
        transport: Arc<dyn Transport>,
    ) -> Result<ExportOutcome, CliError> {
        let address = WalletAddress::parse(&self.wallet_address)?;
        let range = self.block_range()?;
        let config = self.fetch_config(cli.max_retries);

        info!(
            address = %address,
            start_block = range.start,
            end_block = range.end,
            output = %self.output.display(),
            "Fetching transactions"
        );

        let summary = FetchOrchestrator::new(transport, config)
            .execute(&address, range)
            .await;

        if summary.records.is_empty() {
            info!("No transactions found in given block range or API error.");
            return Ok(ExportOutcome::NoTransactions);
        }

        let mut writer = CsvTransactionsWriter::new(&self.output)?;
        writer.write_records(&summary.records)?;
        writer.close()?;

        info!(
            count = summary.records.len(),
            "Export complete -> {}",
            self.output.display()
        );
        Ok(ExportOutcome::Written {
            count: summary.records.len(),
            path: self.output.clone(),
        })
    }
}
