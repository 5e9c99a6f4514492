use crate::ports::outbound::PasswordProvider;
use shared_crypto::Password;
use std::path::Path;

/// Returns the same password for every keystore.
#[derive(Debug, Clone)]
pub struct StaticPasswordProvider {
    password: Password,
}

impl StaticPasswordProvider {
    /// Wrap a password.
    pub fn new(password: Password) -> Self {
        Self { password }
    }
}

impl PasswordProvider for StaticPasswordProvider {
    fn password_for(&self, _keystore_path: &Path) -> Option<Password> {
        Some(self.password.clone())
    }
}
