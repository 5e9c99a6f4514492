//! Domain layer: signer errors, modes and signed payloads.

pub mod errors;
pub mod types;
