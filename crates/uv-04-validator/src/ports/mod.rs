//! # Ports
//!
//! - `outbound`: the external probe runner

pub mod outbound;
