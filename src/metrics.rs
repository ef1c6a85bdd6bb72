//! Observability metrics for the exporter
//!
//! Counters and histograms for explorer requests, retries, rate-limit waits
//! and window adaptation.
//!
//! ## Architecture
//!
//! - Uses `metrics` crate for low-overhead metric collection
//! - Optional Prometheus exporter for a scrape endpoint (`--metrics-addr`)
//! - Without an installed recorder every `record_*` call is a no-op

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::TxCategory;

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Metrics initialization errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Prometheus exporter could not be installed
    #[error("failed to install Prometheus exporter on {addr}: {reason}")]
    Install {
        /// Requested listen address
        addr: SocketAddr,
        /// Underlying failure
        reason: String,
    },
}

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: later calls return `Ok` without reinstalling.
///
/// # Arguments
/// * `addr` - Socket address to bind the scrape endpoint (e.g., "127.0.0.1:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install {
            addr,
            reason: e.to_string(),
        })?;

    describe_counter!(
        "etherscan_requests_total",
        Unit::Count,
        "Explorer queries by category and outcome"
    );

    describe_counter!(
        "etherscan_retries_total",
        Unit::Count,
        "Retried explorer queries by category"
    );

    describe_histogram!(
        "retry_backoff_duration_seconds",
        Unit::Seconds,
        "Duration of retry backoff in seconds"
    );

    describe_histogram!(
        "rate_limit_wait_seconds",
        Unit::Seconds,
        "Time spent waiting on the shared rate limiter"
    );

    describe_counter!(
        "window_shrinks_total",
        Unit::Count,
        "Block windows halved after saturating the result cap"
    );

    describe_counter!(
        "records_fetched_total",
        Unit::Count,
        "Normalized records accepted by category"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Check if metrics system is initialized
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Record one explorer query attempt
pub fn record_request(category: TxCategory, outcome: &'static str) {
    counter!(
        "etherscan_requests_total",
        "category" => category.action(),
        "outcome" => outcome,
    )
    .increment(1);
}

/// Record retry backoff duration
pub fn record_retry_backoff(category: TxCategory, duration: Duration) {
    counter!(
        "etherscan_retries_total",
        "category" => category.action(),
    )
    .increment(1);

    histogram!("retry_backoff_duration_seconds").record(duration.as_secs_f64());

    debug!(
        category = %category,
        backoff_ms = duration.as_millis() as u64,
        "Retry backoff recorded"
    );
}

/// Record time suspended in the rate limiter
pub fn record_rate_limit_wait(duration: Duration) {
    histogram!("rate_limit_wait_seconds").record(duration.as_secs_f64());
}

/// Record a halved block window
pub fn record_window_shrink(category: TxCategory) {
    counter!(
        "window_shrinks_total",
        "category" => category.action(),
    )
    .increment(1);
}

/// Record records accepted from a completed window
pub fn record_records_fetched(category: TxCategory, count: usize) {
    counter!(
        "records_fetched_total",
        "category" => category.action(),
    )
    .increment(count as u64);
}
