//! Password provider backed by an environment variable.

use crate::config::ENV_WALLET_PASSWORD;
use shared_crypto::Password;
use std::path::Path;
use tracing::warn;
use uv_02_signer::PasswordProvider;

/// Reads the password from the environment on every request, so a paranoid
/// signer picks up a rotated value without a restart.
#[derive(Debug, Clone)]
pub struct EnvPasswordProvider {
    var: String,
}

impl EnvPasswordProvider {
    /// Provider reading `var`.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the variable read.
    pub fn var(&self) -> &str {
        &self.var
    }

    /// Current value, if set and non-empty.
    pub fn current(&self) -> Option<Password> {
        match std::env::var(&self.var) {
            Ok(value) if !value.is_empty() => Some(Password::new(value)),
            Ok(_) | Err(std::env::VarError::NotPresent) => None,
            Err(std::env::VarError::NotUnicode(_)) => {
                warn!(var = %self.var, "[runtime] Password variable is not valid UTF-8");
                None
            }
        }
    }
}

impl Default for EnvPasswordProvider {
    fn default() -> Self {
        Self::new(ENV_WALLET_PASSWORD)
    }
}

impl PasswordProvider for EnvPasswordProvider {
    fn password_for(&self, _keystore_path: &Path) -> Option<Password> {
        self.current()
    }
}
