//! # Validator Orchestrator (UV-04)
//!
//! Wires the keystore, signer and hub client together and answers the
//! hub's probe requests through an external `MonitoringExecutor`.
//!
//! ## Lifecycle
//!
//! ```text
//! INITIALIZED -> AUTHENTICATING -> CONNECTING -> REGISTERING -> RUNNING
//!       \______________\________________\______________\__________> STOPPING -> STOPPED
//! ```
//!
//! A failed `start()` cleans up and returns to `INITIALIZED`.
//!
//! ## Guarantees
//!
//! - Every accepted `validate` request produces exactly one signed result.
//!   Executor errors and probe timeouts become `BAD` with 0 ms latency.
//! - A callback id seen before is ignored.
//! - `stop()` runs its cleanup once, however many callers race it.
//! - Exhausted hub reconnects stop the validator.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::{SecurityConfig, ValidatorConfig, ValidatorSettings};
pub use domain::errors::ValidatorError;
pub use domain::ledger::CallbackLedger;
pub use domain::state::ValidatorState;
pub use domain::stats::ValidatorStats;
pub use ports::outbound::{ExecutorError, MonitoringExecutor, ProbeOutcome};
pub use service::Validator;
