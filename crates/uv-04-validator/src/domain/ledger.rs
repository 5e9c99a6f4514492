//! Bounded memory of answered callback ids.

use std::collections::{HashSet, VecDeque};

/// Remembers the most recent `capacity` callback ids.
#[derive(Debug)]
pub struct CallbackLedger {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl CallbackLedger {
    /// Ledger holding at most `capacity` ids.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Record `callback_id`. Returns `false` if it was already recorded.
    pub fn insert(&mut self, callback_id: &str) -> bool {
        if self.seen.contains(callback_id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(callback_id.to_string());
        self.seen.insert(callback_id.to_string());
        true
    }

    /// Ids currently remembered.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Nothing remembered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for CallbackLedger {
    fn default() -> Self {
        Self::new(4096)
    }
}
