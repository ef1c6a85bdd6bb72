//! CSV output writer implementation

use crate::TransactionRecord;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{OutputError, OutputResult, OutputWriter, TransactionsWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// CSV row; field order and header names are the export format
#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    #[serde(rename = "Transaction Hash")]
    transaction_hash: &'a str,
    #[serde(rename = "Date & Time")]
    timestamp: &'a str,
    #[serde(rename = "From Address")]
    from_address: &'a str,
    #[serde(rename = "To Address")]
    to_address: &'a str,
    #[serde(rename = "Transaction Type")]
    category: &'static str,
    #[serde(rename = "Asset Contract Address")]
    asset_contract_address: &'a str,
    #[serde(rename = "Asset Symbol / Name")]
    asset_symbol: &'a str,
    #[serde(rename = "Token ID")]
    token_id: &'a str,
    #[serde(rename = "Value / Amount")]
    amount: &'a str,
    #[serde(rename = "Gas Fee (ETH)")]
    gas_fee: &'a str,
}

impl<'a> From<&'a TransactionRecord> for CsvRecord<'a> {
    fn from(record: &'a TransactionRecord) -> Self {
        Self {
            transaction_hash: &record.transaction_hash,
            timestamp: &record.timestamp,
            from_address: &record.from_address,
            to_address: &record.to_address,
            category: record.category.label(),
            asset_contract_address: &record.asset_contract_address,
            asset_symbol: &record.asset_symbol,
            token_id: &record.token_id,
            amount: &record.amount,
            gas_fee: &record.gas_fee,
        }
    }
}

/// CSV writer for transaction records
pub struct CsvTransactionsWriter {
    writer: Writer<BufWriter<File>>,
    path: PathBuf,
    records_written: u64,
}

impl CsvTransactionsWriter {
    /// Create a new CSV writer
    ///
    /// # Arguments
    /// * `path` - Output file path; missing parent directories are created
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Self::new_with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new CSV writer with custom buffer size
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `buffer_size` - Size of write buffer in bytes
    pub fn new_with_buffer_size<P: AsRef<Path>>(
        path: P,
        buffer_size: usize,
    ) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;

        let buf_writer = BufWriter::with_capacity(buffer_size, file);

        // Header row is emitted by csv::Writer on the first serialize
        Ok(Self {
            writer: Writer::from_writer(buf_writer),
            path: path.to_path_buf(),
            records_written: 0,
        })
    }

    /// Get number of records written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TransactionsWriter for CsvTransactionsWriter {
    fn write_record(&mut self, record: &TransactionRecord) -> OutputResult<()> {
        self.writer
            .serialize(CsvRecord::from(record))
            .map_err(|e| OutputError::CsvError(format!("Failed to write record: {}", e)))?;

        self.records_written += 1;

        if self.records_written % 1000 == 0 {
            self.flush()?;
            debug!("Progress: {} records written", self.records_written);
        }

        Ok(())
    }
}

impl OutputWriter for CsvTransactionsWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }

    fn close(mut self) -> OutputResult<()> {
        self.flush()?;

        let buf_writer = self.writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get inner writer: {}", e))
        })?;

        let file = buf_writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get file handle: {}", e))
        })?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {}", e)))?;

        info!(
            "CSV writer closed successfully: {} records written to {}",
            self.records_written,
            self.path.display()
        );
        Ok(())
    }
}
