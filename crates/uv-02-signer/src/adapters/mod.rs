//! # Adapters

mod password;

pub use password::StaticPasswordProvider;
