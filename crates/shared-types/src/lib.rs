//! # Shared Types Crate
//!
//! Wire protocol between a validator and the coordinating hub.
//!
//! ## Frames
//!
//! Every frame is a JSON object `{type, data, signature?}`:
//!
//! | Direction | `type` | `data` |
//! |-----------|--------|--------|
//! | out | `signup` | `{ip, publicKey, walletAddress, callbackId}` |
//! | out | `validate` | `{callbackId, status, latency, monitorId, validatorId, publicKey}` |
//! | in | `signup` | `{validatorId}` |
//! | in | `validate` | `{url, callbackId, monitorId?}` |
//! | in | `error` | `{message}` |
//!
//! ## Design Principles
//!
//! - **Canonical signing**: signatures cover `canonical_json(data)`, never the
//!   frame text as sent, so key order on the wire does not matter.
//! - **Tolerant decoding**: unknown inbound `type`s decode to
//!   [`InboundMessage::Unknown`] instead of failing.

pub mod canonical;
pub mod envelope;
pub mod errors;
pub mod messages;

pub use canonical::{canonical_json, canonicalize};
pub use envelope::{HubEnvelope, InboundMessage, MessageType};
pub use errors::{ConfigError, ProtocolError};
pub use messages::{
    HubErrorData, SignupAck, SignupRequest, ValidationRequest, ValidationResult, ValidationStatus,
};
