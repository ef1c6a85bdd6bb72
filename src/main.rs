//! Main entry point for the eth-tx-exporter CLI

use clap::Parser;
use eth_tx_exporter::cli::{Cli, Commands};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("eth_tx_exporter=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    // .env must be loaded before clap reads the environment
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = cli.start_metrics().await {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Export(ref args) => args
            .execute(&cli)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!(e)),
        Commands::Validate(ref validate_cmd) => validate_cmd
            .execute()
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!(e)),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
}
