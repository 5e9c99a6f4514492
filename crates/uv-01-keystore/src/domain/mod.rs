//! Domain layer: keystore file format and wallet entities.

pub mod entities;
pub mod errors;
pub mod keystore_file;
