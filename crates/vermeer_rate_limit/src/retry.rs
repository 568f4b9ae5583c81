//! Classification of errors worth retrying.

use vermeer_error::{FetchError, FetchErrorKind};

/// Distinguishes transient failures (worth retrying with backoff) from
/// permanent ones (fail immediately).
///
/// Used by [`crate::RateLimiter::execute`]; nothing in this layer retries
/// without the caller opting in through that method.
pub trait RetryableError {
    /// Whether a retry could plausibly succeed.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for FetchError {
    fn is_retryable(&self) -> bool {
        match self.kind() {
            FetchErrorKind::Network(_) => true,
            FetchErrorKind::RateLimited { .. } => true,
            FetchErrorKind::Status { status, .. } => *status >= 500,
            FetchErrorKind::Decode(_) => false,
        }
    }
}
