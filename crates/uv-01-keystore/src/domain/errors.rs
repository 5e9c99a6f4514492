//! # Keystore Errors

use shared_crypto::CryptoError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from keystore operations.
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// Private key is not 64 hex characters (optional `0x`) or not a valid scalar.
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// A keystore with this name already exists.
    #[error("Wallet '{0}' already exists")]
    DuplicateWallet(String),

    /// No keystore with this name.
    #[error("Wallet '{0}' not found")]
    NotFound(String),

    /// Wallet name contains characters outside `[A-Za-z0-9_-]` or has a bad length.
    #[error("Invalid wallet name '{0}'")]
    InvalidWalletName(String),

    /// Password shorter than the minimum.
    #[error("Password must be at least {min} characters")]
    WeakPassword {
        /// Minimum accepted length.
        min: usize,
    },

    /// Wrong password or tampered ciphertext.
    #[error("Failed to decrypt keystore (wrong password or corrupted file)")]
    DecryptionFailed,

    /// File does not follow the keystore format.
    #[error("Corrupt keystore {path:?}: {reason}")]
    Corrupt {
        /// Offending file.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },

    /// Filesystem error.
    #[error("Keystore I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cryptographic failure other than a failed decryption.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
