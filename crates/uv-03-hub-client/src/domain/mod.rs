//! Domain layer: connection state, events, outbound queue and backoff policy.

pub mod backoff;
pub mod errors;
pub mod events;
pub mod queue;
pub mod state;
