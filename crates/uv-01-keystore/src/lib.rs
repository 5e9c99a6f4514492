//! # Wallet Keystore Subsystem (UV-01)
//!
//! Encrypts wallet private keys at rest and locates keystore files.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): keystore file format, wallet names, errors
//! - **Service Layer** (`service.rs`): `KeystoreManager` filesystem operations
//!
//! ## Keystore Format
//!
//! One JSON file per wallet, `<keystore_dir>/<name>.json`:
//!
//! ```text
//! { version, name, address, publicKey, createdAt,
//!   crypto: { cipher: "xchacha20-poly1305", ciphertext, cipherparams: {nonce},
//!             kdf: "argon2id", kdfparams: {salt, mCost, tCost, pCost, dklen} } }
//! ```
//!
//! ## Security Notes
//!
//! - The plaintext key never touches disk; the address is authenticated as
//!   associated data, so editing the header breaks decryption.
//! - Files are written to a temporary file in the same directory and then
//!   atomically persisted without clobbering an existing wallet.
//! - Listing reads only the cleartext header; nothing is decrypted.

pub mod config;
pub mod domain;
pub mod service;

pub use config::KeystoreConfig;
pub use domain::entities::{ImportedWallet, WalletIdentity, WalletName, WalletSummary};
pub use domain::errors::KeystoreError;
pub use domain::keystore_file::KeystoreFile;
pub use service::KeystoreManager;

/// Minimum password length accepted by `import_wallet`.
pub const MIN_PASSWORD_LEN: usize = 8;
