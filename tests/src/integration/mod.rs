//! End-to-end flows against the mock hub.

mod hub_flows;
mod validator_flows;
