//! # Hub Frame Envelope
//!
//! The universal wrapper for every frame exchanged with the hub.
//!
//! ## Properties
//!
//! - **Typed routing**: `type` selects the payload schema.
//! - **Detached signature**: outbound frames carry `signature` over the
//!   canonical form of `data`; inbound frames from the hub are unsigned.

use crate::messages::{HubErrorData, SignupAck, ValidationRequest};
use crate::ProtocolError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Message types understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Registration request / acknowledgment.
    Signup,
    /// Validation request / result.
    Validate,
    /// Hub-reported error.
    Error,
}

impl MessageType {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Validate => "validate",
            Self::Error => "error",
        }
    }

    /// Parse a wire name.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "signup" => Some(Self::Signup),
            "validate" => Some(Self::Validate),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frame on the hub socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEnvelope {
    /// Wire name of the message type. Kept as a string so unknown types survive decoding.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Message body.
    #[serde(default)]
    pub data: Value,

    /// `0x`-hex signature over `canonical_json(data)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl HubEnvelope {
    /// Unsigned frame.
    pub fn new(message_type: MessageType, data: Value) -> Self {
        Self {
            message_type: message_type.as_str().to_string(),
            data,
            signature: None,
        }
    }

    /// Signed frame.
    pub fn signed(message_type: MessageType, data: Value, signature: String) -> Self {
        Self {
            message_type: message_type.as_str().to_string(),
            data,
            signature: Some(signature),
        }
    }

    /// Parse a frame from socket text.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
    }

    /// Serialize for the socket.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }

    /// Known message type, if any.
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_wire(&self.message_type)
    }

    /// Decode `data` into a typed payload.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.data.clone()).map_err(|e| ProtocolError::InvalidPayload {
            message_type: self.message_type.clone(),
            reason: e.to_string(),
        })
    }
}

/// Decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Hub acknowledged registration.
    SignupAck(SignupAck),
    /// Hub asks for a probe.
    ValidationRequest(ValidationRequest),
    /// Hub reported an error.
    Error(HubErrorData),
    /// Type this validator does not understand.
    Unknown {
        /// The unrecognized wire type.
        message_type: String,
    },
}

impl InboundMessage {
    /// Decode socket text into a typed message.
    ///
    /// # Errors
    ///
    /// `MalformedFrame` when the text is not an envelope, `InvalidPayload`
    /// when a known type carries a bad body. Unknown types are not errors.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope = HubEnvelope::from_json(text)?;
        match envelope.kind() {
            Some(MessageType::Signup) => Ok(Self::SignupAck(envelope.payload()?)),
            Some(MessageType::Validate) => Ok(Self::ValidationRequest(envelope.payload()?)),
            Some(MessageType::Error) => Ok(Self::Error(envelope.payload()?)),
            None => Ok(Self::Unknown {
                message_type: envelope.message_type,
            }),
        }
    }
}
