//! # ECDSA Signatures (secp256k1)
//!
//! Wallet identity and message signing on the secp256k1 curve.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization (EIP-2)
//! - Signing keys are zeroized on drop and have no printable representation
//!
//! ## Wire Formats
//!
//! - Address: EIP-55 checksummed, `0x`-prefixed, 20 bytes
//! - Public key: uncompressed SEC1 (`0x04 || x || y`), hex
//! - Signature: `r || s || v` (65 bytes, `v` in {27, 28}), hex

use crate::hashing::{eip191_hash, keccak256};
use crate::CryptoError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use std::fmt;
use zeroize::Zeroizing;

/// Length of a raw private key in bytes.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Length of a recoverable signature in bytes.
pub const SIGNATURE_LEN: usize = 65;

/// Offset added to the recovery id, as produced by Ethereum wallets.
const RECOVERY_ID_OFFSET: u8 = 27;

/// 20-byte Ethereum-style account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive the address of a public key (last 20 bytes of Keccak256 of `x || y`).
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        // Skip the 0x04 SEC1 tag
        let hash = keccak256(&point.as_bytes()[1..]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        Self(address)
    }

    /// Parse a `0x`-prefixed hex address. Checksum casing is not enforced.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| CryptoError::InvalidAddress)?;
        let array: [u8; 20] = bytes.try_into().map_err(|_| CryptoError::InvalidAddress)?;
        Ok(Self(array))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

/// Recoverable ECDSA signature (65 bytes, `r || s || v`).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature([u8; SIGNATURE_LEN]);

impl RecoverableSignature {
    /// Create from bytes (65 bytes).
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a `0x`-prefixed hex signature.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| CryptoError::InvalidSignature)?;
        let array: [u8; SIGNATURE_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature)?;
        Ok(Self(array))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Recovery byte (27 or 28).
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", self.to_hex())
    }
}

/// Parse a hex-encoded private key (64 hex chars, optional `0x` prefix).
///
/// The decoded bytes are returned in a zeroizing buffer.
pub fn parse_private_key_hex(input: &str) -> Result<Zeroizing<[u8; PRIVATE_KEY_LEN]>, CryptoError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if digits.len() != PRIVATE_KEY_LEN * 2 {
        return Err(CryptoError::InvalidPrivateKey(format!(
            "expected {} hex characters, got {}",
            PRIVATE_KEY_LEN * 2,
            digits.len()
        )));
    }

    let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
    hex::decode_to_slice(digits, &mut bytes[..])
        .map_err(|_| CryptoError::InvalidPrivateKey("not a hex string".into()))?;
    Ok(bytes)
}

/// secp256k1 ECDSA keypair.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes). Rejects zero and out-of-range scalars.
    pub fn from_bytes(bytes: &[u8; PRIVATE_KEY_LEN]) -> Result<Self, CryptoError> {
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|_| CryptoError::InvalidPrivateKey("scalar out of range".into()))?;
        Ok(Self { signing_key })
    }

    /// Create from a hex-encoded private key.
    pub fn from_hex(input: &str) -> Result<Self, CryptoError> {
        let bytes = parse_private_key_hex(input)?;
        Self::from_bytes(&bytes)
    }

    /// Account address derived from the public key.
    pub fn address(&self) -> Address {
        Address::from_verifying_key(self.signing_key.verifying_key())
    }

    /// Uncompressed SEC1 public key, `0x`-prefixed hex.
    pub fn public_key_hex(&self) -> String {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        format!("0x{}", hex::encode(point.as_bytes()))
    }

    /// Sign `message` as an EIP-191 personal message (deterministic RFC 6979).
    pub fn sign_message(&self, message: &[u8]) -> Result<RecoverableSignature, CryptoError> {
        let digest = eip191_hash(message);
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_id.to_byte() + RECOVERY_ID_OFFSET;
        Ok(RecoverableSignature(bytes))
    }

    /// Secret key bytes in a zeroizing buffer (for keystore sealing).
    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_LEN]> {
        Zeroizing::new(self.signing_key.to_bytes().into())
    }
}

impl fmt::Debug for Secp256k1KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secp256k1KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Recover the address that produced `signature` over the EIP-191 `message`.
pub fn recover_signer(message: &[u8], signature: &RecoverableSignature) -> Result<Address, CryptoError> {
    let v = signature.v();
    let recovery_byte = v.checked_sub(RECOVERY_ID_OFFSET).unwrap_or(v);
    let recovery_id = RecoveryId::from_byte(recovery_byte).ok_or(CryptoError::InvalidSignature)?;

    let sig = Signature::from_slice(&signature.as_bytes()[..64])
        .map_err(|_| CryptoError::InvalidSignature)?;

    let digest = eip191_hash(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    Ok(Address::from_verifying_key(&key))
}
