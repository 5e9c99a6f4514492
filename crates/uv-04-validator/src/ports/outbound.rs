//! # Outbound Ports (Driven Ports / SPI)

use shared_types::{ValidationRequest, ValidationStatus};
use thiserror::Error;

/// Result of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Target verdict.
    pub status: ValidationStatus,
    /// Measured latency in milliseconds.
    pub latency_ms: u64,
}

impl ProbeOutcome {
    /// Reported when the probe itself could not run.
    pub const FAILED: Self = Self {
        status: ValidationStatus::Bad,
        latency_ms: 0,
    };
}

/// The executor could not produce an outcome.
#[derive(Debug, Error)]
#[error("Probe failed: {0}")]
pub struct ExecutorError(pub String);

/// Checks a target URL's liveness and latency.
#[async_trait::async_trait]
pub trait MonitoringExecutor: Send + Sync {
    /// Probe `request.url`.
    ///
    /// # Errors
    /// Any error is reported to the hub as `BAD` with 0 ms latency.
    async fn execute(&self, request: &ValidationRequest) -> Result<ProbeOutcome, ExecutorError>;

    /// Release resources on shutdown.
    async fn release(&self) {}
}
