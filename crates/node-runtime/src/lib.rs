//! # Node Runtime Library
//!
//! Process-level pieces of the `uptime-validator` binary, exposed for testing.
//!
//! - `config` - environment configuration
//! - `adapters` - HTTP monitoring executor and environment password provider

#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod config;

pub use adapters::{EnvPasswordProvider, HttpMonitoringExecutor};
pub use config::{RuntimeConfig, RuntimeConfigError};
