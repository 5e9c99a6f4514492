//! # Inbound Ports (Driving Ports / API)

use crate::domain::errors::SignerError;
use crate::domain::types::{SignedPayload, SignerMode};
use serde_json::Value;
use shared_crypto::Password;
use std::path::Path;

/// Signing contract shared by both strategies.
///
/// All methods take `&self`; implementations synchronize internally so a
/// signer can be shared behind an `Arc`. Unlocking and paranoid signing run
/// Argon2id, so async callers should go through `spawn_blocking`.
pub trait MessageSigner: Send + Sync {
    /// Strategy of this signer.
    fn mode(&self) -> SignerMode;

    /// Decrypt the keystore at `keystore_path` and unlock.
    ///
    /// # Errors
    /// * `SignerError::Authentication` - wrong password or corrupt file; signer stays locked
    /// * `SignerError::Destroyed` - signer was destroyed
    fn authenticate(&self, keystore_path: &Path, password: &Password) -> Result<(), SignerError>;

    /// Whether a signature could be produced right now.
    fn is_authenticated(&self) -> bool;

    /// EIP-55 wallet address.
    fn address(&self) -> Result<String, SignerError>;

    /// Uncompressed public key, `0x04...`.
    fn public_key(&self) -> Result<String, SignerError>;

    /// Canonicalize `payload` and sign it.
    ///
    /// # Errors
    /// * `SignerError::NotAuthenticated` - locked, expired or destroyed
    /// * `SignerError::Signing` - signature failed; signer is now locked
    fn sign_message(&self, payload: &Value) -> Result<SignedPayload, SignerError>;

    /// Drop key material. Idempotent.
    fn lock(&self);

    /// Lock and refuse any further `authenticate`. Idempotent.
    fn destroy(&self);
}
