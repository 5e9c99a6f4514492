//! # Adapters
//!
//! Transport helpers around the hub socket.

pub mod local_ip;
