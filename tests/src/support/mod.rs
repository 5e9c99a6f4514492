//! Shared fixtures for the end-to-end flows.

pub mod fixtures;
pub mod mock_hub;

pub use fixtures::*;
pub use mock_hub::{MockHub, ReceivedFrame, WAIT};
