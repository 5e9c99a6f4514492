//! # Outbound Ports (Driven Ports / SPI)

use shared_crypto::Password;
use std::path::Path;

/// Supplies the keystore password on demand.
///
/// Paranoid mode calls this once per signature. Implementations may prompt,
/// read a secret store or return a fixed value; `None` means no password is
/// available and the signature is refused.
pub trait PasswordProvider: Send + Sync {
    /// Password for the keystore at `keystore_path`.
    fn password_for(&self, keystore_path: &Path) -> Option<Password>;
}
