//! Rate limiter configuration.

use crate::{WindowAlgorithm, WindowConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`crate::RateLimiter`] chain.
///
/// Windows are listed outermost-first. The defaults mirror the remote API's
/// published budgets: a per-second token bucket of 50 wrapping a per-minute
/// fixed window of 300.
///
/// # Example
///
/// ```toml
/// [[rate_limit.windows]]
/// capacity = 50
/// interval_ms = 1_000
/// algorithm = "token_bucket"
///
/// [[rate_limit.windows]]
/// capacity = 300
/// interval_ms = 60_000
/// algorithm = "fixed_window"
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct RateLimitConfig {
    /// Ordered window chain, outermost first.
    #[serde(default = "default_windows")]
    #[builder(default = "default_windows()")]
    windows: Vec<WindowConfig>,

    /// Maximum in-flight guarded calls. `None` means unbounded.
    #[serde(default)]
    #[builder(default)]
    max_concurrent: Option<u32>,

    /// Bound on how long `acquire` may wait for a permit (milliseconds).
    /// `None` waits indefinitely.
    #[serde(default)]
    #[builder(default)]
    acquire_timeout_ms: Option<u64>,
}

fn default_windows() -> Vec<WindowConfig> {
    vec![
        WindowConfig {
            capacity: 50,
            interval_ms: 1_000,
            algorithm: WindowAlgorithm::TokenBucket,
        },
        WindowConfig {
            capacity: 300,
            interval_ms: 60_000,
            algorithm: WindowAlgorithm::FixedWindow,
        },
    ]
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            windows: default_windows(),
            max_concurrent: None,
            acquire_timeout_ms: None,
        }
    }
}

impl RateLimitConfig {
    /// A configuration with no windows and no concurrency bound.
    pub fn unlimited() -> Self {
        Self {
            windows: Vec::new(),
            max_concurrent: None,
            acquire_timeout_ms: None,
        }
    }

    /// Acquire timeout as a [`Duration`], when configured.
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }
}
