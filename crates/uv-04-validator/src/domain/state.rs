//! Orchestrator lifecycle.

use serde::Serialize;
use std::fmt;

/// Lifecycle state. `Stopping` is reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidatorState {
    /// Constructed, or a previous `start()` failed.
    #[default]
    Initialized,
    /// Unlocking the wallet.
    Authenticating,
    /// Opening the hub socket.
    Connecting,
    /// Waiting for the signup acknowledgment.
    Registering,
    /// Answering validation requests.
    Running,
    /// `stop()` in progress.
    Stopping,
    /// Terminal.
    Stopped,
}

impl ValidatorState {
    /// `start()` is in progress.
    pub fn is_starting(self) -> bool {
        matches!(self, Self::Authenticating | Self::Connecting | Self::Registering)
    }
}

impl fmt::Display for ValidatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialized => "INITIALIZED",
            Self::Authenticating => "AUTHENTICATING",
            Self::Connecting => "CONNECTING",
            Self::Registering => "REGISTERING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
        };
        f.write_str(name)
    }
}
