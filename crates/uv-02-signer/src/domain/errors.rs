//! # Signer Errors

use thiserror::Error;
use uv_01_keystore::KeystoreError;

/// Errors from signer operations.
#[derive(Debug, Error)]
pub enum SignerError {
    /// Wrong password or unreadable keystore. The signer stays locked.
    #[error("Authentication failed: {0}")]
    Authentication(#[source] KeystoreError),

    /// Operation requires an unlocked signer.
    #[error("Signer is not authenticated")]
    NotAuthenticated,

    /// The signature could not be produced. The signer has been locked.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// `destroy()` was called; the signer cannot be unlocked again.
    #[error("Signer has been destroyed")]
    Destroyed,

    /// The password provider could not supply a password.
    #[error("Password unavailable for keystore {0}")]
    PasswordUnavailable(String),
}

impl SignerError {
    /// True for errors meaning "no usable key": locked, destroyed or failed unlock.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            SignerError::Authentication(_) | SignerError::NotAuthenticated | SignerError::Destroyed
        )
    }
}
