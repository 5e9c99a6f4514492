//! Wallet entities.

use crate::KeystoreError;
use std::fmt;
use std::path::PathBuf;

/// Name used when the caller does not supply one.
pub const DEFAULT_WALLET_NAME: &str = "default";

/// Maximum wallet name length.
const MAX_NAME_LEN: usize = 64;

/// Validated wallet name, safe to use as a file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WalletName(String);

impl WalletName {
    /// Validate a wallet name: 1-64 characters of `[A-Za-z0-9_-]`.
    pub fn parse(name: &str) -> Result<Self, KeystoreError> {
        let valid = !name.is_empty()
            && name.len() <= MAX_NAME_LEN
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(KeystoreError::InvalidWalletName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// The default wallet name.
    pub fn default_name() -> Self {
        Self(DEFAULT_WALLET_NAME.to_string())
    }

    /// As a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Keystore file name for this wallet.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for WalletName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public identity of a wallet. Contains no secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletIdentity {
    /// Wallet name.
    pub name: String,
    /// EIP-55 address.
    pub address: String,
    /// Keystore file.
    pub keystore_path: PathBuf,
    /// Uncompressed public key, hex.
    pub public_key: String,
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedWallet {
    /// EIP-55 address.
    pub address: String,
    /// Keystore file written.
    pub keystore_path: PathBuf,
}

/// Listing entry, derived from file metadata only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSummary {
    /// Wallet name (file stem).
    pub name: String,
    /// EIP-55 address from the keystore header.
    pub address: String,
    /// Keystore file.
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["default", "node-1", "Main_Wallet", "a"] {
            assert!(WalletName::parse(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        let too_long = "x".repeat(65);
        for name in ["", "../escape", "has space", "dot.json", too_long.as_str()] {
            assert!(
                matches!(WalletName::parse(name), Err(KeystoreError::InvalidWalletName(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_file_name() {
        assert_eq!(WalletName::parse("node-1").unwrap().file_name(), "node-1.json");
    }
}
