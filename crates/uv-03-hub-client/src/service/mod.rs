//! # Hub Client Service
//!
//! Public API of the connection manager. Socket lifecycle lives in
//! `connection`, inbound routing in `dispatch`.

mod connection;
mod dispatch;

use crate::adapters::local_ip::outbound_ip;
use crate::config::HubConfig;
use crate::domain::errors::HubError;
use crate::domain::events::{Delivery, HubEvent};
use crate::domain::queue::{requires_registration, OutboundQueue};
use crate::domain::state::ConnectionState;
use futures_util::stream::SplitSink;
use parking_lot::Mutex;
use serde::Serialize;
use shared_types::{HubEnvelope, MessageType, ProtocolError, SignupRequest};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use uv_02_signer::{MessageSigner, SignerError};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;

/// Handles of the background tasks owned by the client.
#[derive(Default)]
pub(crate) struct ConnectionTasks {
    reader: Option<JoinHandle<()>>,
    heartbeat: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
}

impl ConnectionTasks {
    fn replace_connection(&mut self, reader: JoinHandle<()>, heartbeat: JoinHandle<()>) {
        self.abort_connection();
        self.reader = Some(reader);
        self.heartbeat = Some(heartbeat);
    }

    fn abort_connection(&mut self) {
        for handle in [self.reader.take(), self.heartbeat.take()].into_iter().flatten() {
            handle.abort();
        }
    }

    fn replace_reconnect(&mut self, handle: JoinHandle<()>) {
        if let Some(previous) = self.reconnect.replace(handle) {
            previous.abort();
        }
    }

    fn cancel_reconnect(&mut self) {
        if let Some(handle) = self.reconnect.take() {
            handle.abort();
        }
    }

    fn abort_all(&mut self) {
        self.abort_connection();
        self.cancel_reconnect();
    }
}

/// State shared between the client handle and its background tasks.
pub(crate) struct Shared {
    config: HubConfig,
    signer: Arc<dyn MessageSigner>,
    state: Mutex<ConnectionState>,
    /// Bumped for every opened socket; tasks of older sockets compare and bail.
    generation: AtomicU64,
    sink: AsyncMutex<Option<WsSink>>,
    queue: AsyncMutex<OutboundQueue>,
    tasks: Mutex<ConnectionTasks>,
    reconnect_attempts: AtomicU32,
    registration: watch::Sender<Option<String>>,
    events: Mutex<Option<mpsc::UnboundedSender<HubEvent>>>,
    /// Last time anything arrived on the socket.
    last_seen: Mutex<Instant>,
    /// Set by `disconnect()`/`destroy()`, cleared by `connect()`. Suppresses reconnects.
    manual_close: AtomicBool,
    destroyed: AtomicBool,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    fn emit(&self, event: HubEvent) {
        if let Some(events) = self.events.lock().as_ref() {
            let _ = events.send(event);
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    fn is_registered(&self) -> bool {
        self.registration.borrow().is_some()
    }

    fn reconnect_suppressed(&self) -> bool {
        self.is_destroyed() || self.manual_close.load(Ordering::Acquire)
    }
}

/// Connection manager for one hub.
///
/// Cheap to clone; clones share the same socket, queue and tasks.
#[derive(Clone)]
pub struct HubClient {
    shared: Arc<Shared>,
}

impl HubClient {
    /// Create a disconnected client and the receiver for its events.
    pub fn new(
        config: HubConfig,
        signer: Arc<dyn MessageSigner>,
    ) -> (Self, mpsc::UnboundedReceiver<HubEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (registration, _) = watch::channel(None);
        let queue = OutboundQueue::new(config.queue_max_attempts);

        let shared = Arc::new(Shared {
            config,
            signer,
            state: Mutex::new(ConnectionState::Disconnected),
            generation: AtomicU64::new(0),
            sink: AsyncMutex::new(None),
            queue: AsyncMutex::new(queue),
            tasks: Mutex::new(ConnectionTasks::default()),
            reconnect_attempts: AtomicU32::new(0),
            registration,
            events: Mutex::new(Some(events_tx)),
            last_seen: Mutex::new(Instant::now()),
            manual_close: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        });
        (Self { shared }, events_rx)
    }

    /// Open the socket.
    ///
    /// No-op while already connecting or connected. Cancels a pending
    /// reconnect. On success the attempt counter resets, the heartbeat
    /// starts and the outbound queue is flushed in order.
    ///
    /// # Errors
    /// * `HubError::ConnectionTimeout` - handshake exceeded `hub.connectionTimeout`
    /// * `HubError::Connection` - handshake or socket failure
    /// * `HubError::Destroyed` - client was destroyed
    pub async fn connect(&self) -> Result<(), HubError> {
        self.shared.manual_close.store(false, Ordering::Release);
        if !connection::try_begin_connect(&self.shared)? {
            debug!(state = %self.state(), "[hub] connect() ignored, already active");
            return Ok(());
        }
        self.shared.tasks.lock().cancel_reconnect();
        connection::establish(&self.shared).await
    }

    /// Current socket state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Socket is open.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Validator id assigned by the hub on the current connection.
    pub fn validator_id(&self) -> Option<String> {
        self.shared.registration.borrow().clone()
    }

    /// Connected and acknowledged by the hub.
    pub fn is_registered(&self) -> bool {
        self.is_connected() && self.validator_id().is_some()
    }

    /// Watch the validator id. `None` while unregistered.
    pub fn registration(&self) -> watch::Receiver<Option<String>> {
        self.shared.registration.subscribe()
    }

    /// Wait up to `timeout` for a validator id.
    pub async fn wait_for_registration(&self, timeout: Duration) -> Option<String> {
        let mut registration = self.registration();
        let wait = async {
            registration
                .wait_for(Option::is_some)
                .await
                .ok()
                .and_then(|id| (*id).clone())
        };
        tokio::time::timeout(timeout, wait).await.ok().flatten()
    }

    /// Reconnect attempts since the last successful connect.
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.reconnect_attempts.load(Ordering::Acquire)
    }

    /// Frames waiting for a socket.
    pub async fn queue_len(&self) -> usize {
        self.shared.queue.lock().await.len()
    }

    /// Send a frame now if connected, otherwise queue it.
    ///
    /// A failed write queues the frame and drops the socket, which starts a
    /// reconnect. `validate` frames are queued while unregistered. Frames
    /// are never written ahead of older queued frames that could go out.
    pub async fn send_message(&self, envelope: HubEnvelope) -> Result<Delivery, HubError> {
        send_envelope(&self.shared, envelope).await
    }

    /// Sign `data` and send it as `{type, data, signature}`.
    ///
    /// # Errors
    /// * `HubError::NotAuthenticated` - signer is locked
    /// * `HubError::Signing` - signer failed
    pub async fn send_signed_message<T: Serialize + ?Sized>(
        &self,
        message_type: MessageType,
        data: &T,
    ) -> Result<Delivery, HubError> {
        send_signed(&self.shared, message_type, data).await
    }

    /// Announce this validator to the hub.
    ///
    /// The hub answers with a `signup` acknowledgment carrying the
    /// validator id; until then the client is connected but unregistered.
    pub async fn signup(&self) -> Result<Delivery, HubError> {
        send_signup(&self.shared).await
    }

    /// Close the socket and cancel timers. `connect()` may be called again.
    pub async fn disconnect(&self) {
        connection::shutdown(&self.shared).await;
        info!("[hub] Disconnected");
    }

    /// Close the socket, cancel timers and close the event channel. Terminal and idempotent.
    pub async fn destroy(&self) {
        if self.shared.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        connection::shutdown(&self.shared).await;
        self.shared.events.lock().take();
        info!("[hub] Destroyed");
    }
}

async fn send_envelope(shared: &Arc<Shared>, envelope: HubEnvelope) -> Result<Delivery, HubError> {
    if shared.is_destroyed() {
        return Err(HubError::Destroyed);
    }

    let mut queue = shared.queue.lock().await;
    let registered = shared.is_registered();
    let held = !registered && requires_registration(&envelope);
    if shared.state() == ConnectionState::Connected && !held && !queue.has_sendable(registered) {
        let generation = shared.generation.load(Ordering::Acquire);
        match connection::write_frame(shared, &envelope).await {
            Ok(()) => {
                trace!(message_type = %envelope.message_type, "[hub] Frame sent");
                return Ok(Delivery::Sent);
            }
            Err(e) => {
                let id = queue.push(envelope);
                drop(queue);
                warn!(id, error = %e, "[hub] Send failed, frame queued for a fresh socket");
                connection::handle_socket_lost(shared, generation, format!("write failed: {e}")).await;
                return Ok(Delivery::Queued);
            }
        }
    }

    let id = queue.push(envelope);
    if held {
        debug!(id, pending = queue.len(), "[hub] Frame held until registered");
    } else {
        debug!(id, pending = queue.len(), "[hub] Frame queued");
    }
    Ok(Delivery::Queued)
}

async fn send_signed<T: Serialize + ?Sized>(
    shared: &Arc<Shared>,
    message_type: MessageType,
    data: &T,
) -> Result<Delivery, HubError> {
    if shared.is_destroyed() {
        return Err(HubError::Destroyed);
    }
    if !shared.signer.is_authenticated() {
        return Err(HubError::NotAuthenticated);
    }

    let data = serde_json::to_value(data).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
    let signer = Arc::clone(&shared.signer);
    let body = data.clone();
    let signed = tokio::task::spawn_blocking(move || signer.sign_message(&body))
        .await
        .map_err(|e| HubError::Signing(SignerError::Signing(e.to_string())))?
        .map_err(|e| match e {
            SignerError::NotAuthenticated => HubError::NotAuthenticated,
            other => HubError::Signing(other),
        })?;

    send_envelope(shared, HubEnvelope::signed(message_type, data, signed.signature)).await
}

async fn send_signup(shared: &Arc<Shared>) -> Result<Delivery, HubError> {
    let public_key = shared.signer.public_key().map_err(|_| HubError::NotAuthenticated)?;
    let wallet_address = shared.signer.address().map_err(|_| HubError::NotAuthenticated)?;

    let ip = match &shared.config.advertised_ip {
        Some(ip) => ip.clone(),
        None => match outbound_ip(&shared.config.url).await {
            Some(ip) => ip.to_string(),
            None => {
                warn!("[hub] Could not detect outbound address, advertising loopback");
                "127.0.0.1".to_string()
            }
        },
    };

    let request = SignupRequest {
        ip,
        public_key,
        wallet_address,
        callback_id: Uuid::new_v4().to_string(),
    };
    info!(
        callback_id = %request.callback_id,
        wallet = %request.wallet_address,
        "[hub] Sending signup"
    );
    send_signed(shared, MessageType::Signup, &request).await
}
