//! # Validator Service
//!
//! Drives startup, routes hub events and answers validation requests.

use crate::config::ValidatorConfig;
use crate::domain::errors::ValidatorError;
use crate::domain::ledger::CallbackLedger;
use crate::domain::state::ValidatorState;
use crate::domain::stats::ValidatorStats;
use crate::ports::outbound::{MonitoringExecutor, ProbeOutcome};
use chrono::Utc;
use parking_lot::Mutex;
use shared_crypto::Password;
use shared_types::{MessageType, ValidationRequest, ValidationResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use uv_01_keystore::{KeystoreError, KeystoreManager};
use uv_02_signer::MessageSigner;
use uv_03_hub_client::{Delivery, HubClient, HubEvent};

struct Inner {
    config: ValidatorConfig,
    keystore: KeystoreManager,
    signer: Arc<dyn MessageSigner>,
    executor: Arc<dyn MonitoringExecutor>,
    state: watch::Sender<ValidatorState>,
    hub: Mutex<Option<HubClient>>,
    stats: Mutex<ValidatorStats>,
    ledger: Mutex<CallbackLedger>,
    /// Most recent id the hub assigned, kept across disconnects.
    last_validator_id: Mutex<Option<String>>,
    stop_requested: AtomicBool,
}

impl Inner {
    fn state(&self) -> ValidatorState {
        *self.state.borrow()
    }

    /// Move `from -> to`; fails if `stop()` got there first.
    fn advance(&self, from: ValidatorState, to: ValidatorState) -> Result<(), ValidatorError> {
        let moved = self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if !moved {
            return Err(ValidatorError::FatalStartup(format!(
                "validator left {from} during startup"
            )));
        }
        debug!(%from, %to, "[validator] State transition");
        Ok(())
    }
}

/// The validator node core.
///
/// Cheap to clone; clones control the same validator.
#[derive(Clone)]
pub struct Validator {
    inner: Arc<Inner>,
}

impl Validator {
    /// Create an `INITIALIZED` validator.
    pub fn new(
        config: ValidatorConfig,
        signer: Arc<dyn MessageSigner>,
        executor: Arc<dyn MonitoringExecutor>,
    ) -> Self {
        let (state, _) = watch::channel(ValidatorState::Initialized);
        let keystore = KeystoreManager::new(config.keystore());
        Self {
            inner: Arc::new(Inner {
                config,
                keystore,
                signer,
                executor,
                state,
                hub: Mutex::new(None),
                stats: Mutex::new(ValidatorStats::default()),
                ledger: Mutex::new(CallbackLedger::default()),
                last_validator_id: Mutex::new(None),
                stop_requested: AtomicBool::new(false),
            }),
        }
    }

    /// Authenticate `wallet`, connect, register, and begin answering requests.
    ///
    /// Any failure cleans up and leaves the validator `INITIALIZED` and not running.
    ///
    /// # Errors
    /// * `ValidatorError::FatalStartup` - bad configuration or unknown wallet
    /// * `ValidatorError::Authentication` - wrong password or corrupt keystore
    /// * `ValidatorError::Connection` - hub unreachable
    /// * `ValidatorError::RegistrationTimeout` - no signup acknowledgment
    /// * `ValidatorError::AlreadyRunning` - not `INITIALIZED`
    pub async fn start(&self, wallet: &str, password: &Password) -> Result<(), ValidatorError> {
        let inner = &self.inner;
        if inner.advance(ValidatorState::Initialized, ValidatorState::Authenticating).is_err() {
            return Err(ValidatorError::AlreadyRunning);
        }
        info!(%wallet, mode = %inner.signer.mode(), "[validator] Starting");

        match self.run_startup(wallet, password).await {
            Ok(validator_id) => {
                info!(%validator_id, "[validator] Running");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "[validator] Startup failed");
                self.abort_startup().await;
                Err(e)
            }
        }
    }

    async fn run_startup(&self, wallet: &str, password: &Password) -> Result<String, ValidatorError> {
        let inner = &self.inner;
        inner
            .config
            .validate()
            .map_err(|e| ValidatorError::FatalStartup(e.to_string()))?;

        let keystore_path = inner.keystore.get_keystore_path(wallet).map_err(|e| match e {
            KeystoreError::NotFound(name) => {
                ValidatorError::FatalStartup(format!("wallet '{name}' not found"))
            }
            other => ValidatorError::FatalStartup(other.to_string()),
        })?;

        let signer = Arc::clone(&inner.signer);
        let password = password.clone();
        tokio::task::spawn_blocking(move || signer.authenticate(&keystore_path, &password))
            .await
            .map_err(|e| ValidatorError::FatalStartup(format!("authentication task failed: {e}")))??;

        inner.advance(ValidatorState::Authenticating, ValidatorState::Connecting)?;
        let (hub, events) = HubClient::new(inner.config.hub.clone(), Arc::clone(&inner.signer));
        *inner.hub.lock() = Some(hub.clone());
        hub.connect().await?;

        inner.advance(ValidatorState::Connecting, ValidatorState::Registering)?;
        hub.signup().await?;
        let validator_id = hub
            .wait_for_registration(inner.config.hub.registration_timeout())
            .await
            .ok_or(ValidatorError::RegistrationTimeout(
                inner.config.hub.registration_timeout_ms,
            ))?;
        *inner.last_validator_id.lock() = Some(validator_id.clone());

        inner.advance(ValidatorState::Registering, ValidatorState::Running)?;
        inner.stats.lock().started_at = Some(Utc::now());
        tokio::spawn(run_events(self.clone(), hub, events));
        Ok(validator_id)
    }

    async fn abort_startup(&self) {
        let hub = self.inner.hub.lock().take();
        if let Some(hub) = hub {
            hub.destroy().await;
        }
        self.inner.signer.lock();
        self.inner.state.send_if_modified(|state| {
            if state.is_starting() {
                *state = ValidatorState::Initialized;
                true
            } else {
                false
            }
        });
    }

    /// Stop: destroy the hub client, lock the signer, release the executor.
    ///
    /// Idempotent. Calls made while a stop is in progress return immediately.
    pub async fn stop(&self) {
        let inner = &self.inner;
        if inner
            .stop_requested
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("[validator] stop() already in progress");
            return;
        }

        let previous = inner.state.send_replace(ValidatorState::Stopping);
        info!(from = %previous, "[validator] Stopping");

        let hub = inner.hub.lock().take();
        if let Some(hub) = hub {
            hub.destroy().await;
        }
        inner.signer.lock();
        inner.executor.release().await;

        inner.state.send_replace(ValidatorState::Stopped);
        let stats = self.stats();
        info!(
            validations = stats.validations_completed,
            good = stats.good,
            bad = stats.bad,
            uptime_secs = stats.uptime().as_secs(),
            "[validator] Stopped"
        );
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ValidatorState {
        self.inner.state()
    }

    /// `RUNNING`.
    pub fn is_running(&self) -> bool {
        self.state() == ValidatorState::Running
    }

    /// Watch lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ValidatorState> {
        self.inner.state.subscribe()
    }

    /// Resolve once the validator is `STOPPED`.
    pub async fn wait_stopped(&self) {
        let mut state = self.subscribe_state();
        let _ = state.wait_for(|s| *s == ValidatorState::Stopped).await;
    }

    /// Snapshot of the statistics.
    pub fn stats(&self) -> ValidatorStats {
        self.inner.stats.lock().clone()
    }

    /// Validator id on the current hub connection.
    pub fn validator_id(&self) -> Option<String> {
        self.inner.hub.lock().as_ref().and_then(HubClient::validator_id)
    }

    /// Answer one request. Sends exactly one signed result unless the
    /// callback id was already answered.
    async fn handle_validation(&self, hub: HubClient, request: ValidationRequest) {
        let inner = &self.inner;
        if !inner.ledger.lock().insert(&request.callback_id) {
            warn!(callback_id = %request.callback_id, "[validator] Duplicate request ignored");
            inner.stats.lock().duplicate_requests += 1;
            return;
        }

        let captured_id = hub.validator_id().or_else(|| inner.last_validator_id.lock().clone());
        let started = Instant::now();
        let probe = tokio::time::timeout(inner.config.probe_timeout(), inner.executor.execute(&request)).await;
        let (outcome, executor_failed) = match probe {
            Ok(Ok(outcome)) => (outcome, false),
            Ok(Err(e)) => {
                warn!(callback_id = %request.callback_id, error = %e, "[validator] Probe failed, reporting BAD");
                (ProbeOutcome::FAILED, true)
            }
            Err(_) => {
                warn!(
                    callback_id = %request.callback_id,
                    timeout_ms = inner.config.validator.probe_timeout_ms,
                    "[validator] Probe timed out, reporting BAD"
                );
                (ProbeOutcome::FAILED, true)
            }
        };
        debug!(
            callback_id = %request.callback_id,
            status = %outcome.status,
            latency_ms = outcome.latency_ms,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "[validator] Probe finished"
        );

        let delivered = self.report(&hub, &request, outcome, captured_id).await;
        let mut stats = inner.stats.lock();
        stats.record_validation(outcome.status, outcome.latency_ms, executor_failed);
        if !delivered {
            stats.undelivered_results += 1;
        }
    }

    /// Sign and hand one result to the hub client.
    ///
    /// Waits for a validator id when the client is unregistered and falls
    /// back to the id current when the request arrived. The client itself
    /// never writes a `validate` frame before the hub acknowledges `signup`.
    async fn report(
        &self,
        hub: &HubClient,
        request: &ValidationRequest,
        outcome: ProbeOutcome,
        captured_id: Option<String>,
    ) -> bool {
        let inner = &self.inner;
        let validator_id = match hub.validator_id() {
            Some(id) => Some(id),
            None => hub
                .wait_for_registration(inner.config.hub.registration_timeout())
                .await
                .or(captured_id),
        };
        let Some(validator_id) = validator_id else {
            error!(callback_id = %request.callback_id, "[validator] No validator id, result not sent");
            return false;
        };
        let public_key = match inner.signer.public_key() {
            Ok(key) => key,
            Err(e) => {
                error!(callback_id = %request.callback_id, error = %e, "[validator] Cannot sign result");
                return false;
            }
        };

        let result = ValidationResult {
            callback_id: request.callback_id.clone(),
            status: outcome.status,
            latency: outcome.latency_ms,
            monitor_id: request.monitor_id.clone(),
            validator_id,
            public_key,
        };
        match hub.send_signed_message(MessageType::Validate, &result).await {
            Ok(Delivery::Sent) => {
                info!(
                    callback_id = %result.callback_id,
                    status = %result.status,
                    latency_ms = result.latency,
                    "[validator] Result sent"
                );
                true
            }
            Ok(Delivery::Queued) => {
                info!(callback_id = %result.callback_id, "[validator] Result queued until reconnect");
                true
            }
            Err(e) => {
                error!(callback_id = %result.callback_id, error = %e, "[validator] Result not delivered");
                false
            }
        }
    }
}

async fn run_events(validator: Validator, hub: HubClient, mut events: mpsc::UnboundedReceiver<HubEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            HubEvent::ValidationRequest(request) => {
                let validator = validator.clone();
                let hub = hub.clone();
                tokio::spawn(async move { validator.handle_validation(hub, request).await });
            }
            HubEvent::Registered { validator_id } => {
                info!(%validator_id, "[validator] Registered");
                *validator.inner.last_validator_id.lock() = Some(validator_id);
                validator.inner.stats.lock().registrations += 1;
            }
            HubEvent::Disconnected { reason } => {
                warn!(%reason, "[validator] Hub connection lost");
                validator.inner.stats.lock().disconnects += 1;
            }
            HubEvent::Reconnecting { attempt, delay } => {
                debug!(attempt, delay_ms = delay.as_millis() as u64, "[validator] Hub reconnect scheduled");
            }
            HubEvent::Connected => debug!("[validator] Hub connected"),
            HubEvent::ReconnectExhausted { attempts } => {
                error!(attempts, "[validator] Hub unreachable, stopping");
                let validator = validator.clone();
                tokio::spawn(async move { validator.stop().await });
            }
            HubEvent::HubError { message } => warn!(%message, "[validator] Hub error"),
            HubEvent::MessageDropped { id, message_type, attempts } => {
                warn!(id, %message_type, attempts, "[validator] Frame dropped after retries");
                if message_type == MessageType::Validate.as_str() {
                    validator.inner.stats.lock().undelivered_results += 1;
                }
            }
        }
    }
    debug!("[validator] Event loop finished");
}
