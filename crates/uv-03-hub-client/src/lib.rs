//! # Hub Connection Subsystem (UV-03)
//!
//! Persistent, self-healing WebSocket connection from the validator to the hub.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): `ConnectionState`, `HubEvent`, `OutboundQueue`, backoff
//! - **Service Layer** (`service/`): `HubClient`, socket tasks, inbound routing
//! - **Adapters** (`adapters/`): outbound interface address detection
//!
//! ## State Machine
//!
//! ```text
//! DISCONNECTED --connect()--> CONNECTING --open--> CONNECTED
//!      ^                          |                    |
//!      |<-------- failure --------+                    |
//!      |<--- close/error/pong timeout (reconnect) -----+
//!      |<--- disconnect()/destroy() via CLOSING -------+
//! ```
//!
//! Registration (`validatorId`) is orthogonal to the socket state. It is set
//! by the hub's `signup` acknowledgment and cleared whenever the socket drops.
//!
//! ## Delivery
//!
//! Frames written while the socket is down wait in a FIFO queue. A failed
//! write counts as a lost socket: the frame is queued and the client
//! reconnects, so a queued frame is only ever replayed on a fresh socket.
//! Every successful connect flushes the queue in order; each flush pass
//! counts one attempt per entry and an entry out of attempts is dropped with
//! exactly one `HubEvent::MessageDropped`.
//!
//! `validate` results are never written while unregistered. They stay
//! queued until the hub acknowledges `signup`, then flush in order.
//!
//! ## Tasks
//!
//! One reader, one heartbeat and at most one reconnect task exist at a time.
//! Their handles live on the client and the previous handle is aborted
//! before a replacement is stored.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod service;

pub use config::HubConfig;
pub use domain::backoff::backoff_delay;
pub use domain::errors::HubError;
pub use domain::events::{Delivery, HubEvent};
pub use domain::queue::{requires_registration, OutboundQueue, QueuedMessage};
pub use domain::state::ConnectionState;
pub use service::HubClient;
