//! Keystore configuration.

use shared_crypto::KdfParams;
use std::path::PathBuf;

/// Where keystores live and how new ones are sealed.
#[derive(Debug, Clone)]
pub struct KeystoreConfig {
    /// Directory holding `<name>.json` keystore files.
    pub dir: PathBuf,
    /// KDF parameters for newly imported wallets. Existing files keep their own.
    pub kdf: KdfParams,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data/keystores"),
            kdf: KdfParams::default(),
        }
    }
}

impl KeystoreConfig {
    /// Config rooted at `dir` with default KDF parameters.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            kdf: KdfParams::default(),
        }
    }

    /// Config with cheap KDF parameters for tests.
    pub fn for_testing(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            kdf: KdfParams::for_testing(),
        }
    }
}
