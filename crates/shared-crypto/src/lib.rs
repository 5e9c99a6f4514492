//! # Shared Crypto - Validator Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `kdf` | Argon2id | Password-derived keystore keys |
//! | `symmetric` | XChaCha20-Poly1305 | Keystore encryption at rest |
//! | `hashing` | Keccak-256, EIP-191 | Message digests, addresses |
//! | `ecdsa` | secp256k1 | Wallet identity and message signing |
//! | `password` | - | Zeroizing password wrapper |
//!
//! ## Security Properties
//!
//! - **Argon2id**: memory-hard, parameters stored alongside the ciphertext
//! - **XChaCha20**: 192-bit random nonce, authenticated associated data
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S normalization (EIP-2)
//! - Secret material is zeroized on drop and never printed by `Debug`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod kdf;
pub mod password;
pub mod symmetric;

// Re-exports
pub use ecdsa::{
    parse_private_key_hex, recover_signer, Address, RecoverableSignature, Secp256k1KeyPair,
};
pub use errors::CryptoError;
pub use hashing::{eip191_hash, keccak256};
pub use kdf::{derive_key, generate_salt, KdfParams, SALT_LEN};
pub use password::Password;
pub use symmetric::{decrypt, encrypt, Nonce, SecretKey, NONCE_LEN};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
