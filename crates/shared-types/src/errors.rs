//! # Error Types
//!
//! Protocol-level errors are non-fatal for the connection: the offending
//! frame is logged and dropped. `ConfigError` is shared by every config
//! section's `validate()`.

use thiserror::Error;

/// Errors raised while encoding or decoding hub frames.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is not a JSON object with a string `type`.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Known message type with a payload that does not match its schema.
    #[error("Invalid {message_type} payload: {reason}")]
    InvalidPayload {
        /// Wire name of the message type.
        message_type: String,
        /// Decoder error.
        reason: String,
    },

    /// Payload could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Invalid configuration value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid configuration `{field}`: {reason}")]
pub struct ConfigError {
    /// Dotted path of the offending setting, e.g. `hub.url`.
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

impl ConfigError {
    /// Error for `field`.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
