//! Port implementations supplied by the process host.

pub mod env_password;
pub mod http_executor;

pub use env_password::EnvPasswordProvider;
pub use http_executor::HttpMonitoringExecutor;
