//! # Hashing
//!
//! Keccak-256 and the EIP-191 personal-message digest that wallet signatures
//! are computed over.

use sha3::{Digest, Keccak256};

/// 32-byte digest.
pub type Hash = [u8; 32];

/// EIP-191 version 0x45 prefix.
const EIP191_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Digest of `message` as an EIP-191 personal message.
///
/// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`
pub fn eip191_hash(message: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(EIP191_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}
