//! # Keystore Manager
//!
//! Filesystem operations over a keystore directory: import, list, locate,
//! load identities and unlock keypairs.

use crate::config::KeystoreConfig;
use crate::domain::entities::{ImportedWallet, WalletIdentity, WalletName, WalletSummary};
use crate::domain::errors::KeystoreError;
use crate::domain::keystore_file::{KeystoreFile, KeystoreHeader};
use crate::MIN_PASSWORD_LEN;
use fs2::FileExt;
use shared_crypto::{parse_private_key_hex, Password, Secp256k1KeyPair};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const LOCK_FILE_NAME: &str = ".keystore.lock";

/// Manages the keystore directory.
#[derive(Debug, Clone)]
pub struct KeystoreManager {
    config: KeystoreConfig,
}

impl KeystoreManager {
    /// Create a manager over `config.dir`. The directory is created lazily on import.
    pub fn new(config: KeystoreConfig) -> Self {
        Self { config }
    }

    /// Keystore directory.
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Import a hex private key under `name` (default `"default"`).
    ///
    /// # Errors
    ///
    /// - `InvalidWalletName` if `name` is not a safe file stem
    /// - `InvalidPrivateKey` if the key is not 64 hex chars or not a valid scalar
    /// - `WeakPassword` if the password is shorter than 8 characters
    /// - `DuplicateWallet` if a keystore with this name exists
    pub fn import_wallet(
        &self,
        private_key_hex: &str,
        password: &Password,
        name: Option<&str>,
    ) -> Result<ImportedWallet, KeystoreError> {
        let name = match name {
            Some(name) => WalletName::parse(name)?,
            None => WalletName::default_name(),
        };

        let secret = parse_private_key_hex(private_key_hex)
            .map_err(|e| KeystoreError::InvalidPrivateKey(e.to_string()))?;
        let keypair = Secp256k1KeyPair::from_bytes(&secret)
            .map_err(|e| KeystoreError::InvalidPrivateKey(e.to_string()))?;

        if password.char_len() < MIN_PASSWORD_LEN {
            return Err(KeystoreError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }

        fs::create_dir_all(&self.config.dir)?;
        let _guard = self.lock_directory()?;

        let path = self.config.dir.join(name.file_name());
        if path.exists() {
            return Err(KeystoreError::DuplicateWallet(name.to_string()));
        }

        let file = KeystoreFile::seal(name.as_str(), &keypair, password, self.config.kdf)?;
        self.write_atomically(&path, &file.to_json_bytes()?)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => KeystoreError::DuplicateWallet(name.to_string()),
                _ => KeystoreError::Io(e),
            })?;

        info!(
            wallet = %name,
            address = %file.address,
            path = %path.display(),
            "[keystore] Wallet imported"
        );

        Ok(ImportedWallet {
            address: file.address,
            keystore_path: path,
        })
    }

    /// List wallets from keystore headers, sorted by name. Nothing is decrypted.
    ///
    /// Unreadable or malformed files are skipped with a warning.
    pub fn list_wallets(&self) -> Result<Vec<WalletSummary>, KeystoreError> {
        let entries = match fs::read_dir(&self.config.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut wallets = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let Some(stem) = keystore_stem(&path) else {
                continue;
            };
            match KeystoreHeader::load(&path) {
                Ok(header) => wallets.push(WalletSummary {
                    name: stem,
                    address: header.address,
                    path,
                }),
                Err(e) => warn!(path = %path.display(), error = %e, "[keystore] Skipping unreadable keystore"),
            }
        }

        wallets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(wallets)
    }

    /// Whether a keystore exists for `name`. Invalid names never exist.
    pub fn keystore_exists(&self, name: &str) -> bool {
        WalletName::parse(name)
            .map(|name| self.config.dir.join(name.file_name()).is_file())
            .unwrap_or(false)
    }

    /// Path of the keystore for `name`.
    ///
    /// # Errors
    ///
    /// `NotFound` if no keystore exists, `InvalidWalletName` for unsafe names.
    pub fn get_keystore_path(&self, name: &str) -> Result<PathBuf, KeystoreError> {
        let name = WalletName::parse(name)?;
        let path = self.config.dir.join(name.file_name());
        if !path.is_file() {
            return Err(KeystoreError::NotFound(name.to_string()));
        }
        Ok(path)
    }

    /// Public identity of `name`, read from the keystore header.
    pub fn load_wallet(&self, name: &str) -> Result<WalletIdentity, KeystoreError> {
        let path = self.get_keystore_path(name)?;
        let header = KeystoreHeader::load(&path)?;
        Ok(WalletIdentity {
            name: name.to_string(),
            address: header.address,
            keystore_path: path,
            public_key: header.public_key,
        })
    }

    /// Decrypt the keystore at `path`.
    ///
    /// The returned keypair zeroizes its secret on drop; callers own its lifetime.
    pub fn unlock(path: &Path, password: &Password) -> Result<Secp256k1KeyPair, KeystoreError> {
        let file = KeystoreFile::load(path)?;
        let keypair = file.unseal(password, path)?;
        debug!(address = %file.address, "[keystore] Keystore decrypted");
        Ok(keypair)
    }

    fn lock_directory(&self) -> Result<fs::File, KeystoreError> {
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.config.dir.join(LOCK_FILE_NAME))?;
        lock.lock_exclusive()?;
        Ok(lock)
    }

    /// Write to a temp file (mode 0600) in the same directory, fsync, then
    /// link into place. Fails with `AlreadyExists` instead of overwriting.
    fn write_atomically(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".import-")
            .suffix(".tmp")
            .tempfile_in(&self.config.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn keystore_stem(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    WalletName::parse(stem).ok().map(|n| n.to_string())
}
