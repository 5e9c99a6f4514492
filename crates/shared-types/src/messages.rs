//! # Message Payloads
//!
//! The `data` objects carried inside [`crate::HubEnvelope`] frames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    /// Target answered within expectations.
    Good,
    /// Target failed, timed out, or the probe itself failed.
    Bad,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => write!(f, "GOOD"),
            Self::Bad => write!(f, "BAD"),
        }
    }
}

/// Outbound `signup` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// Address the validator advertises.
    pub ip: String,
    /// Uncompressed SEC1 public key, hex.
    pub public_key: String,
    /// EIP-55 wallet address.
    pub wallet_address: String,
    /// Correlation id for the acknowledgment.
    pub callback_id: String,
}

/// Inbound `signup` acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupAck {
    /// Identifier the hub assigned to this validator.
    pub validator_id: String,
}

/// Inbound `validate` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    /// Target to probe.
    pub url: String,
    /// Correlation id echoed in the result.
    pub callback_id: String,
    /// Monitor the target belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_id: Option<String>,
}

/// Outbound `validate` result body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Correlation id of the request being answered.
    pub callback_id: String,
    /// Probe outcome.
    pub status: ValidationStatus,
    /// Probe latency in milliseconds.
    pub latency: u64,
    /// Monitor id from the request (`null` when the hub sent none).
    pub monitor_id: Option<String>,
    /// Hub-assigned validator id.
    pub validator_id: String,
    /// Signer public key.
    pub public_key: String,
}

/// Inbound `error` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubErrorData {
    /// Human-readable error from the hub.
    pub message: String,
}
