//! Retry policy: status classification and backoff schedule.

use std::time::Duration;

use reqwest::StatusCode;

/// What the executor should do with one attempt's HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 2xx: hand the response back to the caller.
    Success,
    /// 429: wait the rate-limit delay, then try again.
    RateLimited,
    /// 5xx: transient, try again after the regular backoff.
    Retry,
    /// Any other status: decode the error body and stop.
    Fail,
}

impl Disposition {
    pub fn is_retryable(self) -> bool {
        matches!(self, Disposition::RateLimited | Disposition::Retry)
    }
}

/// Classifies a response status.
pub fn classify_status(status: StatusCode) -> Disposition {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Disposition::RateLimited
    } else if status.is_success() {
        Disposition::Success
    } else if status.is_server_error() {
        Disposition::Retry
    } else {
        Disposition::Fail
    }
}

/// Delay before `attempt` (zero-based). Linear: `attempt * unit`, none for the first.
pub fn backoff_delay(attempt: usize, unit: Duration) -> Duration {
    let factor = u32::try_from(attempt).unwrap_or(u32::MAX);
    unit.saturating_mul(factor)
}
