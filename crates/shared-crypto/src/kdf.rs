//! # Password-Based Key Derivation
//!
//! Argon2id turns a wallet password into the 256-bit key that seals the
//! keystore. Parameters are persisted next to the ciphertext so a file stays
//! decryptable when defaults change.

use crate::{CryptoError, SecretKey};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// Derived key length in bytes.
pub const DERIVED_KEY_LEN: usize = 32;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Number of passes.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 65_536,
            t_cost: 3,
            p_cost: 4,
        }
    }
}

impl KdfParams {
    /// Cheap parameters for tests. Never use for real keystores.
    pub fn for_testing() -> Self {
        Self {
            m_cost: 1024,
            t_cost: 1,
            p_cost: 1,
        }
    }

    fn to_argon2(self) -> Result<Params, CryptoError> {
        Params::new(
            self.m_cost,
            self.t_cost,
            self.p_cost,
            Some(DERIVED_KEY_LEN),
        )
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))
    }
}

/// Generate a random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut salt);
    salt
}

/// Derive a symmetric key from a password with Argon2id.
///
/// # Errors
///
/// Returns `CryptoError::KeyDerivationFailed` for invalid parameters or salt.
pub fn derive_key(password: &[u8], salt: &[u8], params: KdfParams) -> Result<SecretKey, CryptoError> {
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);

    let mut output = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
    argon
        .hash_password_into(password, salt, &mut output[..])
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    Ok(SecretKey::from_bytes(*output))
}
