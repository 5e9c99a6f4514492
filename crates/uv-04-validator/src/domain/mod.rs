//! Domain layer: lifecycle state, statistics, duplicate guard and errors.

pub mod errors;
pub mod ledger;
pub mod state;
pub mod stats;
