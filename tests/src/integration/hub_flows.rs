//! # Hub Client Flows
//!
//! `HubClient` against the mock hub: signed signup, ordered queue flush,
//! reconnect with re-registration, reconnect exhaustion, liveness, and
//! teardown.

use crate::support::*;
use futures_util::future::join_all;
use serde_json::json;
use shared_types::{MessageType, SignupRequest};
use std::time::Duration;
use tokio::net::TcpListener;
use uv_03_hub_client::{ConnectionState, Delivery, HubClient, HubConfig, HubError, HubEvent};

#[tokio::test]
async fn test_signup_is_signed_and_acknowledged() {
    let hub = MockHub::start(true).await;
    let wallet = TestWallet::create();
    let signer = wallet.unlocked_signer();
    let (client, mut events) = HubClient::new(HubConfig::for_testing(hub.url()), signer.clone());

    client.connect().await.unwrap();
    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(wait_for_event(&mut events, |_| true).await, HubEvent::Connected);

    client.signup().await.unwrap();
    let frame = hub.expect_frame(MessageType::Signup).await;
    assert!(signed_by_test_wallet(&frame.envelope));

    let signup: SignupRequest = frame.envelope.payload().unwrap();
    assert_eq!(signup.ip, "127.0.0.1");
    assert_eq!(signup.wallet_address, ADDRESS);
    assert_eq!(signup.public_key, signer.public_key().unwrap());
    assert!(!signup.callback_id.is_empty());

    let registered = wait_for_event(&mut events, |e| matches!(e, HubEvent::Registered { .. })).await;
    assert_eq!(
        registered,
        HubEvent::Registered {
            validator_id: "validator-0".into()
        }
    );
    assert_eq!(client.validator_id().as_deref(), Some("validator-0"));
    assert!(client.is_registered());

    client.destroy().await;
}

#[tokio::test]
async fn test_queued_frames_flush_in_order_once_registered() {
    let hub = MockHub::start(true).await;
    let wallet = TestWallet::create();
    let (client, _events) = HubClient::new(HubConfig::for_testing(hub.url()), wallet.unlocked_signer());

    for n in 0..3 {
        let delivery = client
            .send_signed_message(MessageType::Validate, &json!({ "seq": n }))
            .await
            .unwrap();
        assert_eq!(delivery, Delivery::Queued);
    }
    assert_eq!(client.queue_len().await, 3);

    client.connect().await.unwrap();
    assert_eq!(client.queue_len().await, 3);
    assert_eq!(client.signup().await.unwrap(), Delivery::Sent);

    assert_eq!(hub.try_next_frame(WAIT).await.unwrap().envelope.kind(), Some(MessageType::Signup));
    for n in 0..3 {
        let frame = hub.expect_frame(MessageType::Validate).await;
        assert_eq!(frame.envelope.data, json!({ "seq": n }));
        assert!(signed_by_test_wallet(&frame.envelope));
    }
    assert_eq!(client.queue_len().await, 0);

    let delivery = client
        .send_signed_message(MessageType::Validate, &json!({ "seq": 3 }))
        .await
        .unwrap();
    assert_eq!(delivery, Delivery::Sent);
    assert_eq!(hub.expect_frame(MessageType::Validate).await.envelope.data, json!({ "seq": 3 }));

    client.destroy().await;
}

#[tokio::test]
async fn test_results_wait_for_signup_ack() {
    let hub = MockHub::start(false).await;
    let wallet = TestWallet::create();
    let (client, mut events) = HubClient::new(HubConfig::for_testing(hub.url()), wallet.unlocked_signer());
    client.connect().await.unwrap();
    client.signup().await.unwrap();
    hub.expect_frame(MessageType::Signup).await;

    let delivery = client
        .send_signed_message(MessageType::Validate, &json!({ "seq": 0 }))
        .await
        .unwrap();
    assert_eq!(delivery, Delivery::Queued);
    assert!(hub.try_next_frame(Duration::from_millis(200)).await.is_none());

    hub.send_text(r#"{"type":"signup","data":{"validatorId":"validator-late"}}"#);
    wait_for_event(&mut events, |e| matches!(e, HubEvent::Registered { .. })).await;
    let frame = hub.expect_frame(MessageType::Validate).await;
    assert_eq!(frame.envelope.data, json!({ "seq": 0 }));
    eventually(|| client.is_registered(), "registration").await;
    assert_eq!(client.queue_len().await, 0);

    client.destroy().await;
}

#[tokio::test]
async fn test_concurrent_connects_open_one_socket() {
    let hub = MockHub::start(false).await;
    let wallet = TestWallet::create();
    let (client, _events) = HubClient::new(HubConfig::for_testing(hub.url()), wallet.unlocked_signer());

    let results = join_all((0..8).map(|_| {
        let client = client.clone();
        async move { client.connect().await }
    }))
    .await;
    assert!(results.iter().all(Result::is_ok), "{results:?}");
    assert!(client.is_connected());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(hub.accepted(), 1);

    client.destroy().await;
}

#[tokio::test]
async fn test_stalled_handshake_times_out() {
    // Accepts TCP but never answers the WebSocket upgrade.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let stalled = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let wallet = TestWallet::create();
    let config = HubConfig {
        connection_timeout_ms: 200,
        ..HubConfig::for_testing(url)
    };
    let (client, _events) = HubClient::new(config, wallet.unlocked_signer());

    let err = client.connect().await.unwrap_err();
    assert!(matches!(err, HubError::ConnectionTimeout(200)), "{err:?}");
    assert_eq!(client.state(), ConnectionState::Disconnected);

    client.destroy().await;
    stalled.abort();
}

#[tokio::test]
async fn test_silent_hub_trips_pong_timeout() {
    let hub = MockHub::start(false).await;
    let wallet = TestWallet::create();
    let (client, mut events) = HubClient::new(HubConfig::for_testing(hub.url()), wallet.unlocked_signer());
    client.connect().await.unwrap();
    wait_for_event(&mut events, |e| *e == HubEvent::Connected).await;

    hub.set_silent(true);
    let lost = wait_for_event(&mut events, |e| matches!(e, HubEvent::Disconnected { .. })).await;
    assert_eq!(
        lost,
        HubEvent::Disconnected {
            reason: "pong timeout".into()
        }
    );
    hub.set_silent(false);

    let reconnecting = wait_for_event(&mut events, |e| matches!(e, HubEvent::Reconnecting { .. })).await;
    assert!(matches!(reconnecting, HubEvent::Reconnecting { attempt: 1, .. }));
    wait_for_event(&mut events, |e| *e == HubEvent::Connected).await;
    assert_eq!(hub.accepted(), 2);

    client.destroy().await;
}

#[tokio::test]
async fn test_lost_socket_reconnects_and_registers_again() {
    let hub = MockHub::start(true).await;
    let wallet = TestWallet::create();
    let (client, mut events) = HubClient::new(HubConfig::for_testing(hub.url()), wallet.unlocked_signer());

    client.connect().await.unwrap();
    client.signup().await.unwrap();
    wait_for_event(&mut events, |e| matches!(e, HubEvent::Registered { .. })).await;

    hub.drop_connections();
    wait_for_event(&mut events, |e| matches!(e, HubEvent::Disconnected { .. })).await;
    let reconnecting = wait_for_event(&mut events, |e| matches!(e, HubEvent::Reconnecting { .. })).await;
    assert_eq!(
        reconnecting,
        HubEvent::Reconnecting {
            attempt: 1,
            delay: Duration::from_millis(20)
        }
    );

    let registered = wait_for_event(&mut events, |e| matches!(e, HubEvent::Registered { .. })).await;
    assert_eq!(
        registered,
        HubEvent::Registered {
            validator_id: "validator-1".into()
        }
    );
    assert_eq!(client.reconnect_attempts(), 0);
    assert_eq!(client.validator_id().as_deref(), Some("validator-1"));

    let resignup = hub.expect_frame(MessageType::Signup).await;
    let resignup = if resignup.connection == 0 {
        hub.expect_frame(MessageType::Signup).await
    } else {
        resignup
    };
    assert_eq!(resignup.connection, 1);
    assert!(signed_by_test_wallet(&resignup.envelope));

    client.destroy().await;
}

#[tokio::test]
async fn test_unreachable_hub_exhausts_reconnects() {
    let hub = MockHub::start(false).await;
    let wallet = TestWallet::create();
    let (client, mut events) = HubClient::new(HubConfig::for_testing(hub.url()), wallet.unlocked_signer());
    client.connect().await.unwrap();

    hub.shutdown();
    let mut attempts = Vec::new();
    let exhausted = wait_for_event(&mut events, |e| {
        if let HubEvent::Reconnecting { attempt, delay } = e {
            attempts.push((*attempt, *delay));
        }
        matches!(e, HubEvent::ReconnectExhausted { .. })
    })
    .await;

    assert_eq!(exhausted, HubEvent::ReconnectExhausted { attempts: 3 });
    assert_eq!(
        attempts,
        vec![
            (1, Duration::from_millis(20)),
            (2, Duration::from_millis(40)),
            (3, Duration::from_millis(60)),
        ]
    );
    assert_eq!(client.state(), ConnectionState::Disconnected);

    client.destroy().await;
}

#[tokio::test]
async fn test_manual_disconnect_does_not_reconnect() {
    let hub = MockHub::start(false).await;
    let wallet = TestWallet::create();
    let (client, _events) = HubClient::new(HubConfig::for_testing(hub.url()), wallet.unlocked_signer());

    client.connect().await.unwrap();
    client.disconnect().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(hub.accepted(), 1);

    client.connect().await.unwrap();
    assert!(client.is_connected());
    eventually(|| hub.accepted() == 2, "second connection").await;

    client.destroy().await;
}

#[tokio::test]
async fn test_malformed_frames_do_not_break_the_connection() {
    let hub = MockHub::start(false).await;
    let wallet = TestWallet::create();
    let (client, mut events) = HubClient::new(HubConfig::for_testing(hub.url()), wallet.unlocked_signer());
    client.connect().await.unwrap();
    eventually(|| hub.accepted() == 1, "connection").await;

    hub.send_text("not json");
    hub.send_text(r#"{"type":"reward","data":{}}"#);
    hub.send_text(r#"{"type":"error","data":{"message":"bad signature"}}"#);
    hub.send_validate("https://example.com", "cb-1", Some("m-1"));

    let error = wait_for_event(&mut events, |e| matches!(e, HubEvent::HubError { .. })).await;
    assert_eq!(
        error,
        HubEvent::HubError {
            message: "bad signature".into()
        }
    );
    let request = wait_for_event(&mut events, |e| matches!(e, HubEvent::ValidationRequest(_))).await;
    let HubEvent::ValidationRequest(request) = request else {
        unreachable!()
    };
    assert_eq!(request.callback_id, "cb-1");
    assert_eq!(request.monitor_id.as_deref(), Some("m-1"));
    assert!(client.is_connected());

    client.destroy().await;
}

#[tokio::test]
async fn test_locked_signer_is_rejected() {
    let hub = MockHub::start(false).await;
    let wallet = TestWallet::create();
    let (client, _events) = HubClient::new(HubConfig::for_testing(hub.url()), wallet.signer(false));
    client.connect().await.unwrap();

    let err = client
        .send_signed_message(MessageType::Validate, &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::NotAuthenticated));
    assert!(hub.try_next_frame(Duration::from_millis(100)).await.is_none());

    client.destroy().await;
}

#[tokio::test]
async fn test_destroy_is_terminal() {
    let hub = MockHub::start(false).await;
    let wallet = TestWallet::create();
    let (client, mut events) = HubClient::new(HubConfig::for_testing(hub.url()), wallet.unlocked_signer());
    client.connect().await.unwrap();

    client.destroy().await;
    client.destroy().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);

    let drained = tokio::time::timeout(WAIT, async { while events.recv().await.is_some() {} }).await;
    assert!(drained.is_ok(), "event channel stays open after destroy");

    assert!(matches!(client.connect().await, Err(HubError::Destroyed)));
    assert!(matches!(
        client.send_signed_message(MessageType::Validate, &json!({})).await,
        Err(HubError::Destroyed)
    ));
}
