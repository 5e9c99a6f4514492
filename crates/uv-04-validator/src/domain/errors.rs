//! # Validator Errors

use thiserror::Error;
use uv_02_signer::SignerError;
use uv_03_hub_client::HubError;

/// Errors that abort `start()`.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// Missing wallet, invalid configuration, or a stop during startup.
    #[error("Fatal startup error: {0}")]
    FatalStartup(String),

    /// Keystore could not be unlocked.
    #[error("Authentication failed: {0}")]
    Authentication(#[from] SignerError),

    /// Hub unreachable or signup could not be sent.
    #[error("Hub connection failed: {0}")]
    Connection(#[from] HubError),

    /// Hub did not acknowledge `signup` in time.
    #[error("Hub did not acknowledge signup within {0} ms")]
    RegistrationTimeout(u64),

    /// `start()` called on a validator that is not `INITIALIZED`.
    #[error("Validator is already started")]
    AlreadyRunning,
}
