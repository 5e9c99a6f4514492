//! # Ports
//!
//! - `inbound`: the signing contract offered to the hub client and orchestrator
//! - `outbound`: where paranoid mode gets its password from

pub mod inbound;
pub mod outbound;
