//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
///
/// Variants never carry secret material, only a description of what failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (wrong key or tampered ciphertext)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Key derivation failed
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Invalid nonce length
    #[error("Invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Expected nonce length in bytes
        expected: usize,
        /// Actual nonce length in bytes
        actual: usize,
    },

    /// Invalid private key (bad hex, wrong length, or out of curve range)
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Invalid address encoding
    #[error("Invalid address")]
    InvalidAddress,

    /// Invalid signature encoding
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Public key recovery failed
    #[error("Failed to recover signer")]
    RecoveryFailed,
}
