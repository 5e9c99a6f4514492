//! Socket lifecycle: handshake, reader, heartbeat, teardown and reconnect.
//!
//! Lock order is `queue` then `sink` then the sync `state`/`tasks` locks.
//! Sync locks are never held across an await.

use super::dispatch::route_frame;
use super::{send_signup, Shared, WsStream};
use crate::domain::backoff::backoff_delay;
use crate::domain::errors::HubError;
use crate::domain::events::HubEvent;
use crate::domain::queue::OutboundQueue;
use crate::domain::state::ConnectionState;
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use shared_types::HubEnvelope;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval_at, sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

type WsSource = SplitStream<WsStream>;

/// Move `Disconnected -> Connecting`.
///
/// `Ok(false)` when a connection is already active.
pub(super) fn try_begin_connect(shared: &Shared) -> Result<bool, HubError> {
    if shared.is_destroyed() {
        return Err(HubError::Destroyed);
    }
    let mut state = shared.state.lock();
    match *state {
        ConnectionState::Connecting | ConnectionState::Connected => Ok(false),
        ConnectionState::Closing => Err(HubError::Connection("client is closing".into())),
        ConnectionState::Disconnected => {
            *state = ConnectionState::Connecting;
            Ok(true)
        }
    }
}

fn abandon_connect(shared: &Shared) {
    let mut state = shared.state.lock();
    if *state == ConnectionState::Connecting {
        *state = ConnectionState::Disconnected;
    }
}

/// Perform the handshake and bring the connection up. Caller has moved the
/// state to `Connecting`.
pub(super) async fn establish(shared: &Arc<Shared>) -> Result<(), HubError> {
    let config = &shared.config;
    debug!(url = %config.url, "[hub] Opening socket");

    let stream = match timeout(config.connection_timeout(), connect_async(config.url.as_str())).await {
        Ok(Ok((stream, _response))) => stream,
        Ok(Err(e)) => {
            abandon_connect(shared);
            return Err(HubError::Connection(e.to_string()));
        }
        Err(_) => {
            abandon_connect(shared);
            return Err(HubError::ConnectionTimeout(config.connection_timeout_ms));
        }
    };
    let (sink, source) = stream.split();

    // Holding the queue lock keeps new sends behind the flush below.
    let mut queue = shared.queue.lock().await;
    let generation = {
        let mut sink_slot = shared.sink.lock().await;
        let generation = {
            let mut state = shared.state.lock();
            if *state != ConnectionState::Connecting || shared.is_destroyed() {
                return Err(HubError::Connection("connection closed during handshake".into()));
            }
            *state = ConnectionState::Connected;
            shared.generation.fetch_add(1, Ordering::AcqRel) + 1
        };

        *sink_slot = Some(sink);
        *shared.last_seen.lock() = Instant::now();
        shared.reconnect_attempts.store(0, Ordering::Release);
        shared.registration.send_replace(None);

        let reader = tokio::spawn(read_loop(Arc::clone(shared), generation, source));
        let heartbeat = tokio::spawn(heartbeat_loop(Arc::clone(shared), generation));
        shared.tasks.lock().replace_connection(reader, heartbeat);
        generation
    };

    info!(url = %config.url, "[hub] Connected");
    shared.emit(HubEvent::Connected);

    flush_queue(shared, generation, &mut queue).await;
    Ok(())
}

/// Write one frame to the open socket, bounded by the connection timeout.
pub(super) async fn write_frame(shared: &Shared, envelope: &HubEnvelope) -> Result<(), HubError> {
    let text = envelope.to_json()?;
    write_message(shared, Message::Text(text.into())).await
}

async fn write_message(shared: &Shared, message: Message) -> Result<(), HubError> {
    let mut slot = shared.sink.lock().await;
    let sink = slot
        .as_mut()
        .ok_or_else(|| HubError::Connection("socket is not open".into()))?;
    match timeout(shared.config.connection_timeout(), sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(HubError::Connection(e.to_string())),
        Err(_) => Err(HubError::Connection("write timed out".into())),
    }
}

/// Send every queued frame that may go out, in order. Each attempted entry
/// spends one attempt; after the first failed write the rest of the pass
/// counts as failed too and the socket is treated as lost. Held entries
/// keep their place and spend nothing.
async fn flush_queue(shared: &Arc<Shared>, generation: u64, queue: &mut OutboundQueue) {
    let registered = shared.is_registered();
    if !queue.has_sendable(registered) {
        return;
    }
    let pending = queue.take_all();
    info!(count = pending.len(), registered, "[hub] Flushing queued frames");

    let mut failure = None;
    for mut message in pending {
        if message.is_held(registered) {
            queue.requeue(message);
            continue;
        }
        message.attempts += 1;
        if failure.is_none() {
            match write_frame(shared, &message.envelope).await {
                Ok(()) => {
                    debug!(id = message.id, attempts = message.attempts, "[hub] Queued frame sent");
                    continue;
                }
                Err(e) => {
                    warn!(id = message.id, error = %e, "[hub] Flush write failed");
                    failure = Some(e);
                }
            }
        }

        if let Some(dropped) = queue.retry_or_drop(message) {
            let error = HubError::QueueExhausted {
                id: dropped.id,
                attempts: dropped.attempts,
            };
            warn!(
                error = %error,
                message_type = %dropped.envelope.message_type,
                queued_for_ms = dropped.enqueued_at.elapsed().as_millis() as u64,
                "[hub] Dropping frame"
            );
            shared.emit(HubEvent::MessageDropped {
                id: dropped.id,
                message_type: dropped.envelope.message_type,
                attempts: dropped.attempts,
            });
        }
    }

    if let Some(e) = failure {
        handle_socket_lost(shared, generation, format!("flush failed: {e}")).await;
    }
}

async fn read_loop(shared: Arc<Shared>, generation: u64, mut source: WsSource) {
    let reason = loop {
        let Some(message) = source.next().await else {
            break "stream ended".to_string();
        };
        *shared.last_seen.lock() = Instant::now();
        match message {
            Ok(Message::Text(text)) => {
                if let Some(event) = route_frame(text.as_str()) {
                    let registered = matches!(event, HubEvent::Registered { .. });
                    if let HubEvent::Registered { validator_id } = &event {
                        info!(%validator_id, "[hub] Registered with hub");
                        shared.registration.send_replace(Some(validator_id.clone()));
                    }
                    shared.emit(event);
                    if registered {
                        let mut queue = shared.queue.lock().await;
                        flush_queue(&shared, generation, &mut queue).await;
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = write_message(&shared, Message::Pong(payload)).await;
            }
            Ok(Message::Close(frame)) => {
                break match frame {
                    Some(frame) => format!(
                        "closed by hub ({}): {}",
                        u16::from(frame.code),
                        frame.reason.as_str()
                    ),
                    None => "closed by hub".to_string(),
                };
            }
            Ok(_) => {}
            Err(e) => break e.to_string(),
        }
    };
    handle_socket_lost(&shared, generation, reason).await;
}

async fn heartbeat_loop(shared: Arc<Shared>, generation: u64) {
    let period = shared.config.ping_interval();
    let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
    loop {
        ticker.tick().await;
        if shared.generation.load(Ordering::Acquire) != generation {
            return;
        }

        if let Some(deadline) = shared.config.pong_timeout() {
            let silent = shared.last_seen.lock().elapsed();
            if silent > deadline {
                warn!(silent_ms = silent.as_millis() as u64, "[hub] No pong from hub, dropping socket");
                handle_socket_lost(&shared, generation, "pong timeout".to_string()).await;
                return;
            }
        }

        if let Err(e) = write_message(&shared, Message::Ping(Default::default())).await {
            debug!(error = %e, "[hub] Ping failed");
        }
    }
}

/// Tear down a socket that failed on its own and schedule a reconnect.
///
/// May run inside the reader or heartbeat task it aborts, so nothing after
/// the abort awaits.
pub(super) async fn handle_socket_lost(shared: &Arc<Shared>, generation: u64, reason: String) {
    {
        let mut state = shared.state.lock();
        if shared.generation.load(Ordering::Acquire) != generation
            || *state != ConnectionState::Connected
            || shared.reconnect_suppressed()
        {
            return;
        }
        *state = ConnectionState::Disconnected;
    }

    drop(shared.sink.lock().await.take());
    shared.registration.send_replace(None);
    warn!(%reason, "[hub] Connection lost");
    shared.emit(HubEvent::Disconnected { reason });

    schedule_reconnect(shared);
    shared.tasks.lock().abort_connection();
}

fn schedule_reconnect(shared: &Arc<Shared>) {
    if shared.reconnect_suppressed() {
        return;
    }
    let handle = tokio::spawn(reconnect_loop(Arc::clone(shared)));
    shared.tasks.lock().replace_reconnect(handle);
}

async fn reconnect_loop(shared: Arc<Shared>) {
    let max_attempts = shared.config.max_reconnect_attempts;
    loop {
        if shared.reconnect_suppressed() {
            return;
        }

        let attempt = shared.reconnect_attempts.fetch_add(1, Ordering::AcqRel) + 1;
        if attempt > max_attempts {
            error!(attempts = max_attempts, "[hub] Reconnect attempts exhausted, giving up");
            shared.emit(HubEvent::ReconnectExhausted {
                attempts: max_attempts,
            });
            return;
        }

        let delay = backoff_delay(
            shared.config.reconnect_interval(),
            attempt,
            shared.config.max_reconnect_delay(),
        );
        info!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            "[hub] Reconnecting"
        );
        shared.emit(HubEvent::Reconnecting { attempt, delay });
        sleep(delay).await;

        if shared.reconnect_suppressed() || !matches!(try_begin_connect(&shared), Ok(true)) {
            return;
        }
        match establish(&shared).await {
            Ok(()) => {
                reregister(&shared).await;
                return;
            }
            Err(e) => warn!(attempt, error = %e, "[hub] Reconnect attempt failed"),
        }
    }
}

/// Best-effort `signup` after a reconnect; the hub does not keep registrations.
async fn reregister(shared: &Arc<Shared>) {
    if !shared.signer.is_authenticated() {
        debug!("[hub] Signer locked, skipping re-registration");
        return;
    }
    if let Err(e) = send_signup(shared).await {
        warn!(error = %e, "[hub] Re-registration after reconnect failed");
    }
}

/// Close the socket for `disconnect()`/`destroy()`. Bounded by the connection timeout.
pub(super) async fn shutdown(shared: &Shared) {
    shared.manual_close.store(true, Ordering::Release);
    *shared.state.lock() = ConnectionState::Closing;

    let sink = shared.sink.lock().await.take();
    shared.tasks.lock().abort_all();
    shared.registration.send_replace(None);

    if let Some(mut sink) = sink {
        let close = async move {
            if sink.send(Message::Close(None)).await.is_ok() {
                let _ = sink.close().await;
            }
        };
        if timeout(shared.config.connection_timeout(), close).await.is_err() {
            debug!("[hub] Close handshake timed out");
        }
    }

    *shared.state.lock() = ConnectionState::Disconnected;
}
