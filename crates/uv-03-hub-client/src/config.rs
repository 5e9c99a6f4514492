//! Hub connection configuration (`hub.*`).

use serde::{Deserialize, Serialize};
use shared_types::ConfigError;
use std::net::IpAddr;
use std::time::Duration;
use tokio_tungstenite::tungstenite::http::Uri;

/// Connection settings. Durations are milliseconds on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HubConfig {
    /// `ws://` or `wss://` endpoint of the hub.
    pub url: String,

    /// Base reconnect delay; attempt `n` waits `n * base`.
    #[serde(rename = "reconnectInterval")]
    pub reconnect_interval_ms: u64,

    /// Reconnect attempts before giving up for good.
    pub max_reconnect_attempts: u32,

    /// Heartbeat ping period.
    #[serde(rename = "pingInterval")]
    pub ping_interval_ms: u64,

    /// Handshake deadline for one connection attempt.
    #[serde(rename = "connectionTimeout")]
    pub connection_timeout_ms: u64,

    /// Tear the socket down when no pong arrives for this long.
    /// `None` means twice the ping interval; `Some(0)` disables the check.
    #[serde(rename = "pongTimeout", skip_serializing_if = "Option::is_none")]
    pub pong_timeout_ms: Option<u64>,

    /// Reconnect delay cap.
    #[serde(rename = "maxReconnectDelay")]
    pub max_reconnect_delay_ms: u64,

    /// Flush attempts per queued message before it is dropped.
    pub queue_max_attempts: u32,

    /// How long a result may wait for a fresh validator id after a reconnect.
    #[serde(rename = "registrationTimeout")]
    pub registration_timeout_ms: u64,

    /// IP announced in `signup`. Detected from the outbound route when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertised_ip: Option<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080".to_string(),
            reconnect_interval_ms: 5_000,
            max_reconnect_attempts: 10,
            ping_interval_ms: 30_000,
            connection_timeout_ms: 10_000,
            pong_timeout_ms: None,
            max_reconnect_delay_ms: 30_000,
            queue_max_attempts: 3,
            registration_timeout_ms: 30_000,
            advertised_ip: None,
        }
    }
}

impl HubConfig {
    /// Short timers for tests against a local hub.
    pub fn for_testing(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_interval_ms: 20,
            max_reconnect_attempts: 3,
            ping_interval_ms: 200,
            connection_timeout_ms: 2_000,
            pong_timeout_ms: None,
            max_reconnect_delay_ms: 100,
            queue_max_attempts: 3,
            registration_timeout_ms: 2_000,
            advertised_ip: Some("127.0.0.1".to_string()),
        }
    }

    /// Check values before connecting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let uri: Uri = self
            .url
            .parse()
            .map_err(|e| ConfigError::new("hub.url", format!("not a URL: {e}")))?;
        match uri.scheme_str() {
            Some("ws") | Some("wss") => {}
            other => {
                return Err(ConfigError::new(
                    "hub.url",
                    format!("scheme must be ws or wss, got {}", other.unwrap_or("none")),
                ))
            }
        }
        if uri.host().map_or(true, str::is_empty) {
            return Err(ConfigError::new("hub.url", "missing host"));
        }

        for (field, value) in [
            ("hub.reconnectInterval", self.reconnect_interval_ms),
            ("hub.pingInterval", self.ping_interval_ms),
            ("hub.connectionTimeout", self.connection_timeout_ms),
            ("hub.maxReconnectDelay", self.max_reconnect_delay_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::new(field, "must be greater than zero"));
            }
        }
        if self.queue_max_attempts == 0 {
            return Err(ConfigError::new("hub.queueMaxAttempts", "must be at least 1"));
        }
        if let Some(ip) = &self.advertised_ip {
            ip.parse::<IpAddr>()
                .map_err(|_| ConfigError::new("hub.advertisedIp", format!("not an IP address: {ip}")))?;
        }
        Ok(())
    }

    /// Base reconnect delay.
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Heartbeat period.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    /// Handshake and write deadline.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// Effective pong deadline, `None` when disabled.
    pub fn pong_timeout(&self) -> Option<Duration> {
        match self.pong_timeout_ms {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => Some(self.ping_interval() * 2),
        }
    }

    /// Reconnect delay cap.
    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }

    /// Registration wait for results produced while unregistered.
    pub fn registration_timeout(&self) -> Duration {
        Duration::from_millis(self.registration_timeout_ms)
    }
}
