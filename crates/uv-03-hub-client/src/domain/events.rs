//! Typed events emitted by the hub client.

use shared_types::ValidationRequest;
use std::time::Duration;

/// Everything the client reports to its owner, in order of occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    /// Socket open.
    Connected,
    /// Socket lost (not emitted for `disconnect()`/`destroy()`).
    Disconnected {
        /// Close reason or error text.
        reason: String,
    },
    /// A reconnect is scheduled.
    Reconnecting {
        /// 1-based attempt number.
        attempt: u32,
        /// Wait before the attempt.
        delay: Duration,
    },
    /// All reconnect attempts failed. No further attempts are made.
    ReconnectExhausted {
        /// Attempts made.
        attempts: u32,
    },
    /// Hub acknowledged `signup`.
    Registered {
        /// Assigned validator id.
        validator_id: String,
    },
    /// Hub asked for a probe.
    ValidationRequest(ValidationRequest),
    /// Hub reported an error.
    HubError {
        /// Hub-supplied text.
        message: String,
    },
    /// A queued message exceeded its flush attempts.
    MessageDropped {
        /// Queue entry id.
        id: u64,
        /// Wire type of the dropped frame.
        message_type: String,
        /// Attempts made.
        attempts: u32,
    },
}

/// Outcome of `send_message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written to the open socket.
    Sent,
    /// Held in the outbound queue until the next connect.
    Queued,
}
