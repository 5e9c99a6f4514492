//! In-process hub speaking the validator protocol over real WebSockets.

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_types::{HubEnvelope, MessageType};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Default wait for anything the hub expects to see.
pub const WAIT: Duration = Duration::from_secs(5);

/// A frame received from a validator.
#[derive(Debug, Clone)]
pub struct ReceivedFrame {
    /// Index of the accepted connection, starting at 0.
    pub connection: usize,
    pub envelope: HubEnvelope,
}

struct Connection {
    outbound: mpsc::UnboundedSender<Message>,
    task: JoinHandle<()>,
}

struct HubState {
    auto_ack: AtomicBool,
    silent: AtomicBool,
    next_index: AtomicUsize,
    accepted: AtomicUsize,
    connections: Mutex<Vec<Connection>>,
    frames: mpsc::UnboundedSender<ReceivedFrame>,
}

/// Mock hub bound to an ephemeral loopback port.
///
/// With `auto_ack` every `signup` on connection `n` is answered with
/// validator id `validator-n`.
pub struct MockHub {
    addr: SocketAddr,
    state: Arc<HubState>,
    frames: AsyncMutex<mpsc::UnboundedReceiver<ReceivedFrame>>,
    acceptor: Mutex<Option<JoinHandle<()>>>,
}

impl MockHub {
    pub async fn start(auto_ack: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let state = Arc::new(HubState {
            auto_ack: AtomicBool::new(auto_ack),
            silent: AtomicBool::new(false),
            next_index: AtomicUsize::new(0),
            accepted: AtomicUsize::new(0),
            connections: Mutex::new(Vec::new()),
            frames: frames_tx,
        });

        let acceptor = tokio::spawn(accept_loop(listener, Arc::clone(&state)));
        Self {
            addr,
            state,
            frames: AsyncMutex::new(frames_rx),
            acceptor: Mutex::new(Some(acceptor)),
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.state.accepted.load(Ordering::SeqCst)
    }

    pub fn set_auto_ack(&self, enabled: bool) {
        self.state.auto_ack.store(enabled, Ordering::SeqCst);
    }

    /// Stop reading from validators: no frames recorded, no pongs sent.
    pub fn set_silent(&self, enabled: bool) {
        self.state.silent.store(enabled, Ordering::SeqCst);
    }

    /// Next frame from any connection, or `None` after `wait`.
    pub async fn try_next_frame(&self, wait: Duration) -> Option<ReceivedFrame> {
        let mut frames = self.frames.lock().await;
        tokio::time::timeout(wait, frames.recv()).await.ok().flatten()
    }

    /// Next frame of `kind`, skipping others. Panics after `WAIT`.
    pub async fn expect_frame(&self, kind: MessageType) -> ReceivedFrame {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let frame = self
                .try_next_frame(remaining)
                .await
                .unwrap_or_else(|| panic!("hub received no {kind} frame"));
            if frame.envelope.kind() == Some(kind) {
                return frame;
            }
        }
    }

    /// Send raw text on the most recent connection.
    pub fn send_text(&self, text: impl Into<String>) {
        let text: String = text.into();
        let connections = self.state.connections.lock();
        let connection = connections.last().expect("no validator connected");
        let _ = connection.outbound.send(Message::Text(text.into()));
    }

    /// Send a `validate` request on the most recent connection.
    pub fn send_validate(&self, url: &str, callback_id: &str, monitor_id: Option<&str>) {
        let mut data = json!({ "url": url, "callbackId": callback_id });
        if let Some(monitor_id) = monitor_id {
            data["monitorId"] = Value::from(monitor_id);
        }
        self.send_text(json!({ "type": "validate", "data": data }).to_string());
    }

    /// Kill every open socket without a close handshake.
    pub fn drop_connections(&self) {
        for connection in self.state.connections.lock().drain(..) {
            connection.task.abort();
        }
    }

    /// Stop listening and kill open sockets. Later connects are refused.
    pub fn shutdown(&self) {
        if let Some(acceptor) = self.acceptor.lock().take() {
            acceptor.abort();
        }
        self.drop_connections();
    }
}

impl Drop for MockHub {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn accept_loop(listener: TcpListener, state: Arc<HubState>) {
    while let Ok((stream, _)) = listener.accept().await {
        let index = state.next_index.fetch_add(1, Ordering::SeqCst);
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(serve(Arc::clone(&state), index, stream, outbound_rx));
        state.connections.lock().push(Connection { outbound, task });
        state.accepted.fetch_add(1, Ordering::SeqCst);
    }
}

async fn serve(
    state: Arc<HubState>,
    index: usize,
    stream: TcpStream,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) {
    let Ok(socket) = accept_async(stream).await else {
        return;
    };
    let (mut sink, mut source) = socket.split();

    loop {
        tokio::select! {
            incoming = source.next(), if !state.silent.load(Ordering::SeqCst) => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let Ok(envelope) = HubEnvelope::from_json(text.as_str()) else {
                        continue;
                    };
                    let is_signup = envelope.kind() == Some(MessageType::Signup);
                    let _ = state.frames.send(ReceivedFrame { connection: index, envelope });
                    if is_signup && state.auto_ack.load(Ordering::SeqCst) {
                        let ack = json!({
                            "type": "signup",
                            "data": { "validatorId": format!("validator-{index}") }
                        });
                        if sink.send(Message::Text(ack.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    if sink.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            message = outbound.recv() => match message {
                Some(message) => {
                    if sink.send(message).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::time::sleep(Duration::from_millis(20)), if state.silent.load(Ordering::SeqCst) => {}
        }
    }
}
