//! HTTP liveness probe.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;
use shared_types::{ValidationRequest, ValidationStatus};
use std::time::{Duration, Instant};
use tracing::debug;
use uv_04_validator::{ExecutorError, MonitoringExecutor, ProbeOutcome};

/// Probes a target with a single `GET`.
///
/// 2xx and 3xx answers are `GOOD`; any other status is `BAD` with the
/// measured latency. Transport failures and timeouts are executor errors.
/// Redirects are not followed.
#[derive(Debug, Clone)]
pub struct HttpMonitoringExecutor {
    client: Client,
}

impl HttpMonitoringExecutor {
    /// Executor whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ExecutorError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .user_agent(concat!("uptime-validator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExecutorError(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MonitoringExecutor for HttpMonitoringExecutor {
    async fn execute(&self, request: &ValidationRequest) -> Result<ProbeOutcome, ExecutorError> {
        let started = Instant::now();
        let response = self
            .client
            .get(&request.url)
            .send()
            .await
            .map_err(|e| ExecutorError(e.to_string()))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let code = response.status();
        let status = if code.is_success() || code.is_redirection() {
            ValidationStatus::Good
        } else {
            ValidationStatus::Bad
        };
        debug!(url = %request.url, code = code.as_u16(), latency_ms, "[runtime] Probe answered");
        Ok(ProbeOutcome { status, latency_ms })
    }
}
