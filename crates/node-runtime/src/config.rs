//! # Runtime Configuration
//!
//! Defaults from `ValidatorConfig`, overridden by `UV_*` environment variables.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `UV_HUB_URL` | `hub.url` |
//! | `UV_RECONNECT_INTERVAL_MS` | `hub.reconnectInterval` |
//! | `UV_MAX_RECONNECT_ATTEMPTS` | `hub.maxReconnectAttempts` |
//! | `UV_PING_INTERVAL_MS` | `hub.pingInterval` |
//! | `UV_CONNECTION_TIMEOUT_MS` | `hub.connectionTimeout` |
//! | `UV_KEYSTORE_DIR` | `security.keystoreDir` |
//! | `UV_PARANOID` | `security.paranoidMode` |
//! | `UV_SESSION_TIMEOUT_MINUTES` | `security.sessionTimeoutMinutes` |
//! | `UV_WALLET` | wallet to unlock (default `default`) |
//!
//! `UV_WALLET_PASSWORD` is read by `EnvPasswordProvider`, never stored here.

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use uv_04_validator::ValidatorConfig;

pub const ENV_HUB_URL: &str = "UV_HUB_URL";
pub const ENV_KEYSTORE_DIR: &str = "UV_KEYSTORE_DIR";
pub const ENV_PARANOID: &str = "UV_PARANOID";
pub const ENV_SESSION_TIMEOUT_MINUTES: &str = "UV_SESSION_TIMEOUT_MINUTES";
pub const ENV_RECONNECT_INTERVAL_MS: &str = "UV_RECONNECT_INTERVAL_MS";
pub const ENV_MAX_RECONNECT_ATTEMPTS: &str = "UV_MAX_RECONNECT_ATTEMPTS";
pub const ENV_PING_INTERVAL_MS: &str = "UV_PING_INTERVAL_MS";
pub const ENV_CONNECTION_TIMEOUT_MS: &str = "UV_CONNECTION_TIMEOUT_MS";
pub const ENV_WALLET: &str = "UV_WALLET";
pub const ENV_WALLET_PASSWORD: &str = "UV_WALLET_PASSWORD";

const DEFAULT_WALLET: &str = "default";

/// An environment variable held an unusable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{var}={value:?}: {reason}")]
pub struct RuntimeConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Everything the binary needs before starting the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub validator: ValidatorConfig,
    pub wallet: String,
}

impl RuntimeConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, RuntimeConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Unset and blank variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RuntimeConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = ValidatorConfig::default();

        if let Some(url) = get(ENV_HUB_URL) {
            config.hub.url = url.trim().to_string();
        }
        if let Some(dir) = get(ENV_KEYSTORE_DIR) {
            config.security.keystore_dir = PathBuf::from(dir);
        }
        if let Some(value) = get(ENV_PARANOID) {
            config.security.paranoid_mode = parse_flag(ENV_PARANOID, &value)?;
        }
        if let Some(value) = get(ENV_SESSION_TIMEOUT_MINUTES) {
            config.security.session_timeout_minutes = parse_number(ENV_SESSION_TIMEOUT_MINUTES, &value)?;
        }
        if let Some(value) = get(ENV_RECONNECT_INTERVAL_MS) {
            config.hub.reconnect_interval_ms = parse_number(ENV_RECONNECT_INTERVAL_MS, &value)?;
        }
        if let Some(value) = get(ENV_MAX_RECONNECT_ATTEMPTS) {
            config.hub.max_reconnect_attempts = parse_number(ENV_MAX_RECONNECT_ATTEMPTS, &value)?;
        }
        if let Some(value) = get(ENV_PING_INTERVAL_MS) {
            config.hub.ping_interval_ms = parse_number(ENV_PING_INTERVAL_MS, &value)?;
        }
        if let Some(value) = get(ENV_CONNECTION_TIMEOUT_MS) {
            config.hub.connection_timeout_ms = parse_number(ENV_CONNECTION_TIMEOUT_MS, &value)?;
        }

        let wallet = get(ENV_WALLET).unwrap_or_else(|| DEFAULT_WALLET.to_string());
        Ok(Self {
            validator: config,
            wallet: wallet.trim().to_string(),
        })
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, RuntimeConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RuntimeConfigError {
            var,
            value: value.to_string(),
            reason: "expected true or false".into(),
        }),
    }
}

fn parse_number<T>(var: &'static str, value: &str) -> Result<T, RuntimeConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| RuntimeConfigError {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
