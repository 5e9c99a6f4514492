//! Encrypted keystore file format (Argon2id + XChaCha20-Poly1305).

use crate::KeystoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_crypto::{
    decrypt, derive_key, encrypt, generate_salt, CryptoError, KdfParams, Nonce, Password,
    Secp256k1KeyPair,
};
use std::path::Path;
use zeroize::Zeroizing;

/// Current file format version.
pub const KEYSTORE_VERSION: u32 = 1;

const CIPHER_NAME: &str = "xchacha20-poly1305";
const KDF_NAME: &str = "argon2id";
const DERIVED_KEY_LEN: u32 = 32;

/// On-disk keystore. Holds cipher parameters, salt, nonce and ciphertext only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystoreFile {
    /// Format version.
    pub version: u32,
    /// Wallet name at import time.
    pub name: String,
    /// EIP-55 address of the sealed key (authenticated as associated data).
    pub address: String,
    /// Uncompressed public key, hex.
    pub public_key: String,
    /// Import time.
    pub created_at: DateTime<Utc>,
    /// Encryption section.
    pub crypto: CryptoSection,
}

/// Cipher and KDF parameters plus the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoSection {
    /// Cipher name.
    pub cipher: String,
    /// Hex ciphertext (includes the Poly1305 tag).
    pub ciphertext: String,
    /// Cipher parameters.
    pub cipherparams: CipherParams,
    /// KDF name.
    pub kdf: String,
    /// KDF parameters.
    pub kdfparams: KdfSection,
}

/// Cipher parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherParams {
    /// Hex 24-byte nonce.
    pub nonce: String,
}

/// KDF parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfSection {
    /// Hex salt.
    pub salt: String,
    /// Argon2 costs.
    #[serde(flatten)]
    pub params: KdfParams,
    /// Derived key length.
    pub dklen: u32,
}

/// Cleartext header fields, readable without the password.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystoreHeader {
    /// Wallet name at import time.
    pub name: String,
    /// EIP-55 address.
    pub address: String,
    /// Uncompressed public key, hex.
    pub public_key: String,
}

impl KeystoreFile {
    /// Seal `keypair` under `password`.
    pub fn seal(
        name: &str,
        keypair: &Secp256k1KeyPair,
        password: &Password,
        params: KdfParams,
    ) -> Result<Self, KeystoreError> {
        let address = keypair.address().to_checksum();
        let salt = generate_salt();
        let key = derive_key(password.as_bytes(), &salt, params)?;

        let secret = keypair.to_bytes();
        let (ciphertext, nonce) = encrypt(&key, secret.as_ref(), &associated_data(&address))?;

        Ok(Self {
            version: KEYSTORE_VERSION,
            name: name.to_string(),
            address,
            public_key: keypair.public_key_hex(),
            created_at: Utc::now(),
            crypto: CryptoSection {
                cipher: CIPHER_NAME.to_string(),
                ciphertext: hex::encode(ciphertext),
                cipherparams: CipherParams {
                    nonce: hex::encode(nonce.as_bytes()),
                },
                kdf: KDF_NAME.to_string(),
                kdfparams: KdfSection {
                    salt: hex::encode(salt),
                    params,
                    dklen: DERIVED_KEY_LEN,
                },
            },
        })
    }

    /// Decrypt the keypair.
    ///
    /// # Errors
    ///
    /// `DecryptionFailed` for a wrong password or tampered file, `Corrupt`
    /// when the file structure is invalid.
    pub fn unseal(&self, password: &Password, path: &Path) -> Result<Secp256k1KeyPair, KeystoreError> {
        let corrupt = |reason: &str| KeystoreError::Corrupt {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if self.version != KEYSTORE_VERSION {
            return Err(corrupt(&format!("unsupported version {}", self.version)));
        }
        if self.crypto.cipher != CIPHER_NAME || self.crypto.kdf != KDF_NAME {
            return Err(corrupt("unsupported cipher or kdf"));
        }

        let salt = hex::decode(&self.crypto.kdfparams.salt).map_err(|_| corrupt("salt is not hex"))?;
        let nonce_bytes =
            hex::decode(&self.crypto.cipherparams.nonce).map_err(|_| corrupt("nonce is not hex"))?;
        let nonce = Nonce::from_slice(&nonce_bytes).map_err(|_| corrupt("bad nonce length"))?;
        let ciphertext =
            hex::decode(&self.crypto.ciphertext).map_err(|_| corrupt("ciphertext is not hex"))?;

        let key = derive_key(password.as_bytes(), &salt, self.crypto.kdfparams.params)?;
        let plaintext = Zeroizing::new(
            decrypt(&key, &ciphertext, &nonce, &associated_data(&self.address)).map_err(
                |e| match e {
                    CryptoError::DecryptionFailed(_) => KeystoreError::DecryptionFailed,
                    other => KeystoreError::Crypto(other),
                },
            )?,
        );

        let secret: Zeroizing<[u8; 32]> = Zeroizing::new(
            plaintext
                .as_slice()
                .try_into()
                .map_err(|_| corrupt("sealed key has wrong length"))?,
        );
        let keypair = Secp256k1KeyPair::from_bytes(&secret)?;

        if !keypair
            .address()
            .to_checksum()
            .eq_ignore_ascii_case(&self.address)
        {
            return Err(corrupt("sealed key does not match address"));
        }
        Ok(keypair)
    }

    /// Read and parse a keystore file.
    pub fn load(path: &Path) -> Result<Self, KeystoreError> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| KeystoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Pretty JSON bytes for writing.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, KeystoreError> {
        serde_json::to_vec_pretty(self).map_err(|e| KeystoreError::Corrupt {
            path: Default::default(),
            reason: e.to_string(),
        })
    }
}

impl KeystoreHeader {
    /// Read only the cleartext header of a keystore file.
    pub fn load(path: &Path) -> Result<Self, KeystoreError> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| KeystoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

fn associated_data(address: &str) -> Vec<u8> {
    format!("uv-keystore:v{}:{}", KEYSTORE_VERSION, address.to_ascii_lowercase()).into_bytes()
}
