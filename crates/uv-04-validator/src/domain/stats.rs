//! Validator statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared_types::ValidationStatus;
use std::time::Duration;

/// Counters and timestamps, updated once per completed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorStats {
    /// Validations answered (or attempted to answer).
    pub validations_completed: u64,
    /// Results reported `GOOD`.
    pub good: u64,
    /// Results reported `BAD`.
    pub bad: u64,
    /// Executor errors and probe timeouts.
    pub executor_failures: u64,
    /// Results that could not be signed or handed to the hub client.
    pub undelivered_results: u64,
    /// Requests ignored because their callback id was already answered.
    pub duplicate_requests: u64,
    /// Signup acknowledgments received.
    pub registrations: u64,
    /// Unplanned socket losses.
    pub disconnects: u64,
    /// Sum of reported latencies.
    pub total_latency_ms: u64,
    /// When the validator reached `RUNNING`.
    pub started_at: Option<DateTime<Utc>>,
    /// When the last validation completed.
    pub last_validation_at: Option<DateTime<Utc>>,
}

impl ValidatorStats {
    /// Count one completed validation.
    pub fn record_validation(&mut self, status: ValidationStatus, latency_ms: u64, executor_failed: bool) {
        self.validations_completed += 1;
        match status {
            ValidationStatus::Good => self.good += 1,
            ValidationStatus::Bad => self.bad += 1,
        }
        if executor_failed {
            self.executor_failures += 1;
        }
        self.total_latency_ms = self.total_latency_ms.saturating_add(latency_ms);
        self.last_validation_at = Some(Utc::now());
    }

    /// Mean reported latency.
    pub fn average_latency_ms(&self) -> Option<f64> {
        (self.validations_completed > 0)
            .then(|| self.total_latency_ms as f64 / self.validations_completed as f64)
    }

    /// Time since `started_at`.
    pub fn uptime(&self) -> Duration {
        self.started_at
            .and_then(|started| (Utc::now() - started).to_std().ok())
            .unwrap_or_default()
    }
}
