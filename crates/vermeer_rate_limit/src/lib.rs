//! Layered rate limiting for outbound API calls.
//!
//! Every cache-miss fetch and every paginated page request passes through a
//! [`RateLimiter`]: an ordered chain of windows (token bucket for sustained
//! per-second throughput, fixed window for the coarser per-minute budget)
//! that must *all* grant a permit before the call proceeds. Acquisition is
//! atomic across the chain: either every window is debited or none is, so a
//! caller blocked by the outer window never strands budget in the inner one.

#![warn(missing_docs)]

mod config;
mod limiter;
mod retry;
mod window;

pub use config::{RateLimitConfig, RateLimitConfigBuilder};
pub use limiter::{RateLimiter, RateLimiterGuard};
pub use retry::RetryableError;
pub use window::{WindowAlgorithm, WindowConfig};
