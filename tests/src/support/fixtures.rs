//! Wallets, signers and executors for tests.

use shared_crypto::Password;
use shared_types::{ValidationRequest, ValidationStatus};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use uv_01_keystore::{KeystoreConfig, KeystoreManager};
use uv_02_signer::{build_signer, MessageSigner, SignerConfig, StaticPasswordProvider};
use uv_03_hub_client::HubEvent;
use uv_04_validator::{ExecutorError, MonitoringExecutor, ProbeOutcome};

pub const WALLET: &str = "main";
pub const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub const ADDRESS: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";
pub const PASSWORD: &str = "correct horse battery";

pub fn password() -> Password {
    Password::from(PASSWORD)
}

/// Keystore directory holding wallet `main`.
pub struct TestWallet {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestWallet {
    pub fn create() -> Self {
        let dir = TempDir::new().unwrap();
        let imported = KeystoreManager::new(KeystoreConfig::for_testing(dir.path()))
            .import_wallet(KEY, &password(), Some(WALLET))
            .unwrap();
        Self {
            dir,
            path: imported.keystore_path,
        }
    }

    /// Signer for this wallet, not yet authenticated.
    pub fn signer(&self, paranoid: bool) -> Arc<dyn MessageSigner> {
        build_signer(
            SignerConfig::from_minutes(paranoid, 0),
            Arc::new(StaticPasswordProvider::new(password())),
        )
    }

    /// Signer for this wallet, already authenticated.
    pub fn unlocked_signer(&self) -> Arc<dyn MessageSigner> {
        let signer = self.signer(false);
        signer.authenticate(&self.path, &password()).unwrap();
        signer
    }
}

/// Executor with a scripted answer.
pub struct ScriptedExecutor {
    outcome: Result<ProbeOutcome, String>,
    delay: Duration,
    pub calls: AtomicUsize,
    pub releases: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn answering(status: ValidationStatus, latency_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(ProbeOutcome { status, latency_ms }),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(reason.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        })
    }

    pub fn slow(status: ValidationStatus, latency_ms: u64, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(ProbeOutcome { status, latency_ms }),
            delay,
            calls: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MonitoringExecutor for ScriptedExecutor {
    async fn execute(&self, _request: &ValidationRequest) -> Result<ProbeOutcome, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone().map_err(ExecutorError)
    }

    async fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Wait for the first event matching `predicate`. Panics after `WAIT`.
pub async fn wait_for_event<F>(events: &mut mpsc::UnboundedReceiver<HubEvent>, mut predicate: F) -> HubEvent
where
    F: FnMut(&HubEvent) -> bool,
{
    let found = tokio::time::timeout(super::WAIT, async {
        while let Some(event) = events.recv().await {
            if predicate(&event) {
                return Some(event);
            }
        }
        None
    })
    .await;
    match found {
        Ok(Some(event)) => event,
        Ok(None) => panic!("event channel closed"),
        Err(_) => panic!("timed out waiting for hub event"),
    }
}

/// Poll `condition` every 10 ms until it holds. Panics after `WAIT`.
pub async fn eventually<F>(mut condition: F, what: &str)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + super::WAIT;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// The frame's signature recovers to the test wallet.
pub fn signed_by_test_wallet(envelope: &shared_types::HubEnvelope) -> bool {
    let Some(signature) = envelope.signature.as_deref() else {
        return false;
    };
    let canonical = shared_types::canonicalize(&envelope.data);
    uv_02_signer::verify_signed_payload(&canonical, signature, ADDRESS).unwrap()
}
