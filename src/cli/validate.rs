//! Validation subcommand

use super::CliError;
use crate::address::WalletAddress;
use clap::Parser;

/// Validate command for checking wallet addresses
#[derive(Parser, Debug)]
pub struct ValidateCommand {
    /// Wallet address to validate
    pub wallet_address: String,
}

impl ValidateCommand {
    /// Execute the validation command
    pub fn execute(&self) -> Result<WalletAddress, CliError> {
        match WalletAddress::parse(&self.wallet_address) {
            Ok(address) => {
                println!("Valid address: {}", address);
                println!("  Normalized: {}", address.normalized());
                Ok(address)
            }
            Err(e) => {
                eprintln!("Invalid address: {}", e);
                Err(e.into())
            }
        }
    }
}
