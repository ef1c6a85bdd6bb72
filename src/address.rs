//! Wallet address parsing and validation
//!
//! Accepts the hex address shape `0x` + 40 hex characters, case-insensitive.
//! No EIP-55 checksum verification is performed.

use std::fmt;

const ADDRESS_PREFIX: &str = "0x";
const ADDRESS_HEX_LEN: usize = 40;

/// Validated wallet address
///
/// The original spelling is preserved for queries; [`WalletAddress::normalized`]
/// gives the lower-case form.
///
/// # Examples
///
/// ```
/// use eth_tx_exporter::address::WalletAddress;
///
/// let address = WalletAddress::parse("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045").unwrap();
/// assert_eq!(address.normalized(), "0xd8da6bf26964af9d7eed9e03e53415d37aa96045");
/// assert!(WalletAddress::parse("0x123").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletAddress {
    raw: String,
}

impl WalletAddress {
    /// Parse and validate a wallet address
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error when the prefix, length or characters do not match.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let s = s.trim();

        let hex = s.strip_prefix(ADDRESS_PREFIX).ok_or_else(|| {
            AddressError::InvalidFormat(format!("address must start with {ADDRESS_PREFIX}: {s:?}"))
        })?;

        if hex.len() != ADDRESS_HEX_LEN {
            return Err(AddressError::InvalidFormat(format!(
                "address must have {ADDRESS_HEX_LEN} hex characters after {ADDRESS_PREFIX}, got {}",
                hex.len()
            )));
        }

        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidFormat(format!(
                "address contains non-hex character {bad:?}"
            )));
        }

        Ok(Self { raw: s.to_string() })
    }

    /// Address as given by the caller
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lower-case form
    pub fn normalized(&self) -> String {
        self.raw.to_lowercase()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for WalletAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors that can occur during address parsing
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    /// Address does not match `0x` + 40 hex characters
    #[error("invalid wallet address: {0}")]
    InvalidFormat(String),
}
