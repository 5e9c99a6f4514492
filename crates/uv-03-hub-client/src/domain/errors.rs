//! # Hub Client Errors

use shared_types::ProtocolError;
use thiserror::Error;
use uv_02_signer::SignerError;

/// Errors from hub client operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// Handshake or socket failure.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Handshake did not finish within `hub.connectionTimeout`.
    #[error("Connection attempt timed out after {0} ms")]
    ConnectionTimeout(u64),

    /// Signed send attempted without an authenticated signer.
    #[error("Signer is not authenticated")]
    NotAuthenticated,

    /// Signer refused or failed to sign.
    #[error("Signing failed: {0}")]
    Signing(#[from] SignerError),

    /// Frame could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Queued message dropped after its last flush attempt.
    #[error("Message {id} dropped after {attempts} attempts")]
    QueueExhausted {
        /// Queue entry id.
        id: u64,
        /// Attempts made.
        attempts: u32,
    },

    /// Client was destroyed.
    #[error("Hub client has been destroyed")]
    Destroyed,
}
