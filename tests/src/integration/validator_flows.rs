//! # Validator Flows
//!
//! The full node core against the mock hub: startup, signed results,
//! executor failures, duplicate requests, outages and shutdown.

use crate::support::*;
use shared_types::{MessageType, ValidationResult, ValidationStatus};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use uv_02_signer::MessageSigner;
use uv_04_validator::{Validator, ValidatorConfig, ValidatorError, ValidatorState};

struct Node {
    validator: Validator,
    signer: Arc<dyn MessageSigner>,
    executor: Arc<ScriptedExecutor>,
    _wallet: TestWallet,
}

fn node_with(hub: &MockHub, executor: Arc<ScriptedExecutor>, tune: impl FnOnce(&mut ValidatorConfig)) -> Node {
    let wallet = TestWallet::create();
    let mut config = ValidatorConfig::for_testing(hub.url(), wallet.dir.path());
    tune(&mut config);
    let signer = wallet.signer(config.security.paranoid_mode);
    let validator = Validator::new(config, Arc::clone(&signer), executor.clone());
    Node {
        validator,
        signer,
        executor,
        _wallet: wallet,
    }
}

fn node(hub: &MockHub, executor: Arc<ScriptedExecutor>) -> Node {
    node_with(hub, executor, |_| {})
}

async fn expect_result(hub: &MockHub) -> (ReceivedFrame, ValidationResult) {
    let frame = hub.expect_frame(MessageType::Validate).await;
    let result = frame.envelope.payload().unwrap();
    (frame, result)
}

#[tokio::test]
async fn test_validation_round_trip() {
    let hub = MockHub::start(true).await;
    let node = node(&hub, ScriptedExecutor::answering(ValidationStatus::Good, 120));

    node.validator.start(WALLET, &password()).await.unwrap();
    assert_eq!(node.validator.state(), ValidatorState::Running);
    assert_eq!(node.validator.validator_id().as_deref(), Some("validator-0"));

    let signup = hub.expect_frame(MessageType::Signup).await;
    assert!(signed_by_test_wallet(&signup.envelope));

    hub.send_validate("https://example.com", "cb-1", Some("m-1"));
    let (frame, result) = expect_result(&hub).await;
    assert!(signed_by_test_wallet(&frame.envelope));
    assert_eq!(result.callback_id, "cb-1");
    assert_eq!(result.status, ValidationStatus::Good);
    assert_eq!(result.latency, 120);
    assert_eq!(result.monitor_id.as_deref(), Some("m-1"));
    assert_eq!(result.validator_id, "validator-0");
    assert_eq!(result.public_key, node.signer.public_key().unwrap());

    eventually(|| node.validator.stats().validations_completed == 1, "stats update").await;
    let stats = node.validator.stats();
    assert_eq!(stats.good, 1);
    assert_eq!(stats.registrations, 1);
    assert_eq!(stats.average_latency_ms(), Some(120.0));
    assert!(stats.started_at.is_some());

    node.validator.stop().await;
}

#[tokio::test]
async fn test_executor_failure_reports_bad() {
    let hub = MockHub::start(true).await;
    let node = node(&hub, ScriptedExecutor::failing("connection refused"));
    node.validator.start(WALLET, &password()).await.unwrap();

    hub.send_validate("https://down.example", "cb-2", None);
    let (frame, result) = expect_result(&hub).await;
    assert!(signed_by_test_wallet(&frame.envelope));
    assert_eq!(result.status, ValidationStatus::Bad);
    assert_eq!(result.latency, 0);
    assert_eq!(result.monitor_id, None);

    eventually(|| node.validator.stats().executor_failures == 1, "failure counted").await;
    assert_eq!(node.validator.stats().bad, 1);
    node.validator.stop().await;
}

#[tokio::test]
async fn test_probe_timeout_reports_bad() {
    let hub = MockHub::start(true).await;
    let executor = ScriptedExecutor::slow(ValidationStatus::Good, 5, Duration::from_secs(10));
    let node = node_with(&hub, executor, |config| config.validator.probe_timeout_ms = 100);
    node.validator.start(WALLET, &password()).await.unwrap();

    hub.send_validate("https://slow.example", "cb-3", None);
    let (_, result) = expect_result(&hub).await;
    assert_eq!(result.status, ValidationStatus::Bad);
    assert_eq!(result.latency, 0);
    node.validator.stop().await;
}

#[tokio::test]
async fn test_duplicate_callback_is_answered_once() {
    let hub = MockHub::start(true).await;
    let node = node(&hub, ScriptedExecutor::answering(ValidationStatus::Good, 7));
    node.validator.start(WALLET, &password()).await.unwrap();

    hub.send_validate("https://example.com", "cb-dup", None);
    hub.send_validate("https://example.com", "cb-dup", None);
    let (_, result) = expect_result(&hub).await;
    assert_eq!(result.callback_id, "cb-dup");

    eventually(|| node.validator.stats().duplicate_requests == 1, "duplicate counted").await;
    let extra = hub.try_next_frame(Duration::from_millis(200)).await;
    assert!(extra.is_none(), "second result sent: {extra:?}");
    assert_eq!(node.executor.calls(), 1);
    node.validator.stop().await;
}

#[tokio::test]
async fn test_paranoid_mode_round_trip() {
    let hub = MockHub::start(true).await;
    let node = node_with(&hub, ScriptedExecutor::answering(ValidationStatus::Good, 42), |config| {
        config.security.paranoid_mode = true;
    });
    node.validator.start(WALLET, &password()).await.unwrap();

    hub.send_validate("https://example.com", "cb-p", None);
    let (frame, result) = expect_result(&hub).await;
    assert!(signed_by_test_wallet(&frame.envelope));
    assert_eq!(result.latency, 42);
    node.validator.stop().await;
}

#[tokio::test]
async fn test_missing_acknowledgment_times_out() {
    let hub = MockHub::start(false).await;
    let node = node_with(&hub, ScriptedExecutor::answering(ValidationStatus::Good, 1), |config| {
        config.hub.registration_timeout_ms = 200;
    });

    let err = node.validator.start(WALLET, &password()).await.unwrap_err();
    assert!(matches!(err, ValidatorError::RegistrationTimeout(200)));
    assert_eq!(node.validator.state(), ValidatorState::Initialized);
    assert!(!node.signer.is_authenticated());
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let hub = MockHub::start(true).await;
    let node = node(&hub, ScriptedExecutor::answering(ValidationStatus::Good, 1));
    node.validator.start(WALLET, &password()).await.unwrap();

    let err = node.validator.start(WALLET, &password()).await.unwrap_err();
    assert!(matches!(err, ValidatorError::AlreadyRunning));
    assert!(node.validator.is_running());
    node.validator.stop().await;
}

#[tokio::test]
async fn test_result_survives_hub_outage() {
    let hub = MockHub::start(true).await;
    let executor = ScriptedExecutor::slow(ValidationStatus::Good, 9, Duration::from_millis(300));
    let node = node(&hub, executor);
    node.validator.start(WALLET, &password()).await.unwrap();

    hub.send_validate("https://example.com", "cb-outage", None);
    eventually(|| node.executor.calls() == 1, "probe start").await;
    hub.drop_connections();

    let (frame, result) = expect_result(&hub).await;
    assert_eq!(frame.connection, 1);
    assert!(signed_by_test_wallet(&frame.envelope));
    assert_eq!(result.callback_id, "cb-outage");
    assert!(result.validator_id == "validator-1" || result.validator_id == "validator-0");

    eventually(|| node.validator.stats().disconnects == 1, "disconnect counted").await;
    assert!(node.validator.is_running());
    node.validator.stop().await;
}

#[tokio::test]
async fn test_unreachable_hub_stops_validator() {
    let hub = MockHub::start(true).await;
    let node = node(&hub, ScriptedExecutor::answering(ValidationStatus::Good, 1));
    node.validator.start(WALLET, &password()).await.unwrap();

    hub.shutdown();
    tokio::time::timeout(WAIT, node.validator.wait_stopped())
        .await
        .expect("validator did not stop");
    assert_eq!(node.validator.state(), ValidatorState::Stopped);
    assert!(!node.signer.is_authenticated());
    assert_eq!(node.executor.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_stop_cleans_up_once() {
    let hub = MockHub::start(true).await;
    let node = node(&hub, ScriptedExecutor::answering(ValidationStatus::Good, 1));
    node.validator.start(WALLET, &password()).await.unwrap();

    let other = node.validator.clone();
    tokio::join!(node.validator.stop(), other.stop());
    node.validator.wait_stopped().await;

    assert_eq!(node.validator.state(), ValidatorState::Stopped);
    assert!(!node.signer.is_authenticated());
    assert_eq!(node.executor.releases.load(Ordering::SeqCst), 1);
    assert_eq!(node.validator.validator_id(), None);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(hub.accepted(), 1);
}
