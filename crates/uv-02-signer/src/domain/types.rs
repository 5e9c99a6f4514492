//! Signer value types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which signing strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerMode {
    /// Key cached in memory for the session.
    #[default]
    Standard,
    /// Key re-derived for every signature and discarded immediately.
    Paranoid,
}

impl fmt::Display for SignerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerMode::Standard => f.write_str("standard"),
            SignerMode::Paranoid => f.write_str("paranoid"),
        }
    }
}

/// Signer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignerConfig {
    /// Strategy.
    pub mode: SignerMode,
    /// Standard mode re-locks after this long. `None` never expires.
    pub session_timeout: Option<Duration>,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self::from_minutes(false, 60)
    }
}

impl SignerConfig {
    /// Build from the `security.*` settings. `0` minutes disables expiry.
    pub fn from_minutes(paranoid: bool, session_timeout_minutes: u64) -> Self {
        Self {
            mode: if paranoid {
                SignerMode::Paranoid
            } else {
                SignerMode::Standard
            },
            session_timeout: (session_timeout_minutes > 0)
                .then(|| Duration::from_secs(session_timeout_minutes * 60)),
        }
    }
}

/// Result of signing a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    /// `0x`-hex `r || s || v`.
    pub signature: String,
    /// The exact bytes that were signed.
    pub canonical_payload: String,
}
