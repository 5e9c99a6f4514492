//! # Uptime Validator Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support/      # Mock hub, wallets, scripted executors
//! └── integration/  # Hub client and validator flows over real sockets
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p uv-tests
//! cargo test -p uv-tests integration::validator_flows
//! ```

pub mod support;

#[cfg(test)]
mod integration;
