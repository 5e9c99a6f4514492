//! Outbound retry queue.
//!
//! Frames that could not be written wait here until the next successful
//! connect. Entries are strictly FIFO and each carries its own attempt
//! budget; an entry whose budget is spent is handed back to the caller as
//! dropped and never retried again.
//!
//! `validate` results are held while the client is unregistered; they keep
//! their place in line and spend no attempts until a validator id arrives.

use shared_types::{HubEnvelope, MessageType};
use std::collections::VecDeque;
use std::time::Instant;

/// A frame waiting for a socket.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    /// Monotonic queue id.
    pub id: u64,
    /// Frame to send.
    pub envelope: HubEnvelope,
    /// When it entered the queue.
    pub enqueued_at: Instant,
    /// Flush attempts made so far.
    pub attempts: u32,
    /// Flush attempts allowed.
    pub max_attempts: u32,
}

/// Frames the hub only accepts from a registered validator.
pub fn requires_registration(envelope: &HubEnvelope) -> bool {
    envelope.kind() == Some(MessageType::Validate)
}

impl QueuedMessage {
    /// Waiting for a validator id rather than for a socket.
    pub fn is_held(&self, registered: bool) -> bool {
        !registered && requires_registration(&self.envelope)
    }

    /// No attempts left.
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

/// FIFO of undelivered frames.
#[derive(Debug)]
pub struct OutboundQueue {
    entries: VecDeque<QueuedMessage>,
    next_id: u64,
    max_attempts: u32,
}

impl OutboundQueue {
    /// Empty queue; every entry gets `max_attempts` flush attempts.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 1,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Append a frame and return its id.
    pub fn push(&mut self, envelope: HubEnvelope) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_back(QueuedMessage {
            id,
            envelope,
            enqueued_at: Instant::now(),
            attempts: 0,
            max_attempts: self.max_attempts,
        });
        id
    }

    /// Remove every entry for a flush pass, oldest first.
    pub fn take_all(&mut self) -> Vec<QueuedMessage> {
        self.entries.drain(..).collect()
    }

    /// Put back an entry whose flush attempt failed, or return it if its
    /// budget is spent.
    ///
    /// Called in the order entries were taken, so requeued entries keep
    /// their relative order.
    pub fn retry_or_drop(&mut self, message: QueuedMessage) -> Option<QueuedMessage> {
        if message.is_exhausted() {
            return Some(message);
        }
        self.entries.push_back(message);
        None
    }

    /// Put back an entry that was not attempted in this pass.
    pub fn requeue(&mut self, message: QueuedMessage) {
        self.entries.push_back(message);
    }

    /// Some entry may be written now.
    pub fn has_sendable(&self, registered: bool) -> bool {
        self.entries.iter().any(|m| !m.is_held(registered))
    }

    /// Pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No pending entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::MessageType;

    fn frame(n: u32) -> HubEnvelope {
        HubEnvelope::new(MessageType::Validate, json!({ "n": n }))
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = OutboundQueue::new(3);
        for n in 0..5 {
            queue.push(frame(n));
        }
        let taken: Vec<_> = queue.take_all().into_iter().map(|m| m.envelope.data["n"].clone()).collect();
        assert_eq!(taken, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut queue = OutboundQueue::new(3);
        let a = queue.push(frame(0));
        let b = queue.push(frame(1));
        queue.take_all();
        let c = queue.push(frame(2));
        assert!(a < b && b < c);
    }

    #[test]
    fn test_dropped_exactly_once_after_budget() {
        let mut queue = OutboundQueue::new(3);
        queue.push(frame(0));

        let mut dropped = Vec::new();
        for _ in 0..10 {
            for mut message in queue.take_all() {
                message.attempts += 1;
                if let Some(gone) = queue.retry_or_drop(message) {
                    dropped.push(gone);
                }
            }
        }

        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].attempts, 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_validate_frames_held_until_registered() {
        let mut queue = OutboundQueue::new(3);
        queue.push(frame(0));
        assert!(!queue.has_sendable(false));
        assert!(queue.has_sendable(true));

        queue.push(HubEnvelope::new(MessageType::Signup, json!({})));
        assert!(queue.has_sendable(false));
    }

    #[test]
    fn test_requeue_keeps_relative_order() {
        let mut queue = OutboundQueue::new(5);
        for n in 0..3 {
            queue.push(frame(n));
        }
        for mut message in queue.take_all() {
            message.attempts += 1;
            assert!(queue.retry_or_drop(message).is_none());
        }
        queue.push(frame(3));

        let order: Vec<_> = queue.take_all().into_iter().map(|m| m.envelope.data["n"].clone()).collect();
        assert_eq!(order, vec![json!(0), json!(1), json!(2), json!(3)]);
    }
}
