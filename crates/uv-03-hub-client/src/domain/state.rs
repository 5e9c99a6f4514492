//! Socket lifecycle state.

use std::fmt;

/// Socket state. Registration is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No socket.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Socket open; heartbeat running.
    Connected,
    /// `disconnect()` or `destroy()` in progress.
    Closing,
}

impl ConnectionState {
    /// `connect()` is a no-op in these states.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Closing => "CLOSING",
        };
        f.write_str(name)
    }
}
