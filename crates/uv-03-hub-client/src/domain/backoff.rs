//! Reconnect backoff policy.

use std::time::Duration;

/// Delay before reconnect attempt `attempt` (1-based): `min(base * attempt, cap)`.
///
/// Non-decreasing in `attempt` and never above `cap`.
pub fn backoff_delay(base: Duration, attempt: u32, cap: Duration) -> Duration {
    base.saturating_mul(attempt.max(1)).min(cap)
}
