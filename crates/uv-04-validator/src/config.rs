//! Validator configuration: `hub.*`, `security.*` and `validator.*`.

use serde::{Deserialize, Serialize};
use shared_crypto::KdfParams;
use shared_types::ConfigError;
use std::path::PathBuf;
use std::time::Duration;
use uv_01_keystore::KeystoreConfig;
use uv_02_signer::SignerConfig;
use uv_03_hub_client::HubConfig;

/// Key handling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityConfig {
    /// Directory of `<wallet>.json` keystores.
    pub keystore_dir: PathBuf,
    /// Re-derive the key for every signature.
    pub paranoid_mode: bool,
    /// Standard-mode session length. `0` never expires.
    pub session_timeout_minutes: u64,
    /// Argon2id parameters for newly imported wallets.
    pub kdf: KdfParams,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            keystore_dir: PathBuf::from("./data/keystores"),
            paranoid_mode: false,
            session_timeout_minutes: 60,
            kdf: KdfParams::default(),
        }
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorSettings {
    /// Deadline for one executor probe, milliseconds.
    #[serde(rename = "probeTimeout")]
    pub probe_timeout_ms: u64,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 30_000,
        }
    }
}

/// Everything the validator consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// Hub connection.
    pub hub: HubConfig,
    /// Keystore and signer.
    pub security: SecurityConfig,
    /// Orchestrator.
    pub validator: ValidatorSettings,
}

impl ValidatorConfig {
    /// Local hub, cheap KDF and short timers.
    pub fn for_testing(hub_url: impl Into<String>, keystore_dir: impl Into<PathBuf>) -> Self {
        Self {
            hub: HubConfig::for_testing(hub_url),
            security: SecurityConfig {
                keystore_dir: keystore_dir.into(),
                paranoid_mode: false,
                session_timeout_minutes: 0,
                kdf: KdfParams::for_testing(),
            },
            validator: ValidatorSettings {
                probe_timeout_ms: 1_000,
            },
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hub.validate()?;
        if self.security.keystore_dir.as_os_str().is_empty() {
            return Err(ConfigError::new("security.keystoreDir", "must not be empty"));
        }
        if self.validator.probe_timeout_ms == 0 {
            return Err(ConfigError::new("validator.probeTimeout", "must be greater than zero"));
        }
        Ok(())
    }

    /// Keystore settings derived from `security.*`.
    pub fn keystore(&self) -> KeystoreConfig {
        KeystoreConfig {
            dir: self.security.keystore_dir.clone(),
            kdf: self.security.kdf,
        }
    }

    /// Signer settings derived from `security.*`.
    pub fn signer(&self) -> SignerConfig {
        SignerConfig::from_minutes(self.security.paranoid_mode, self.security.session_timeout_minutes)
    }

    /// Probe deadline.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.validator.probe_timeout_ms)
    }
}
