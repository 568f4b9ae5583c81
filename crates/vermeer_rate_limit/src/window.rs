//! Rate limit window algorithms.
//!
//! Two algorithms cover the remote's published limits:
//! - **Token bucket**: capacity `C` refilling continuously at `C / interval`,
//!   smoothing sustained throughput while allowing short bursts.
//! - **Fixed window**: capacity `C` shared by every call inside an interval,
//!   with a hard reset at interval boundaries.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Admission algorithm for a single window.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WindowAlgorithm {
    /// Continuous refill up to capacity.
    TokenBucket,
    /// Shared budget with a hard reset at interval boundaries.
    FixedWindow,
}

/// Configuration for one window in a limiter chain.
///
/// Chains are ordered outermost-first; a call must obtain a permit from
/// every window before proceeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Permits available per interval.
    pub capacity: u32,
    /// Refill or reset interval in milliseconds.
    pub interval_ms: u64,
    /// Admission algorithm.
    pub algorithm: WindowAlgorithm,
}

impl WindowConfig {
    /// Token-bucket window with the given capacity and refill interval.
    pub fn token_bucket(capacity: u32, interval: Duration) -> Self {
        Self {
            capacity,
            interval_ms: interval.as_millis() as u64,
            algorithm: WindowAlgorithm::TokenBucket,
        }
    }

    /// Fixed window with the given capacity per interval.
    pub fn fixed_window(capacity: u32, interval: Duration) -> Self {
        Self {
            capacity,
            interval_ms: interval.as_millis() as u64,
            algorithm: WindowAlgorithm::FixedWindow,
        }
    }

    /// Interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Live state for one window in the chain.
#[derive(Debug)]
pub(crate) enum WindowState {
    TokenBucket {
        capacity: f64,
        tokens: f64,
        refill_per_sec: f64,
        last_refill: Instant,
    },
    FixedWindow {
        capacity: u32,
        interval: Duration,
        window_start: Instant,
        used: u32,
    },
}

impl WindowState {
    pub(crate) fn from_config(config: &WindowConfig, now: Instant) -> Self {
        match config.algorithm {
            WindowAlgorithm::TokenBucket => Self::TokenBucket {
                capacity: f64::from(config.capacity),
                tokens: f64::from(config.capacity),
                refill_per_sec: f64::from(config.capacity) / config.interval().as_secs_f64(),
                last_refill: now,
            },
            WindowAlgorithm::FixedWindow => Self::FixedWindow {
                capacity: config.capacity,
                interval: config.interval(),
                window_start: now,
                used: 0,
            },
        }
    }

    pub(crate) fn capacity(&self) -> u32 {
        match self {
            Self::TokenBucket { capacity, .. } => *capacity as u32,
            Self::FixedWindow { capacity, .. } => *capacity,
        }
    }

    /// Advance internal clocks to `now`: refill tokens, roll the window.
    pub(crate) fn sync(&mut self, now: Instant) {
        match self {
            Self::TokenBucket {
                capacity,
                tokens,
                refill_per_sec,
                last_refill,
            } => {
                let elapsed = now.saturating_duration_since(*last_refill);
                *tokens = (*tokens + elapsed.as_secs_f64() * *refill_per_sec).min(*capacity);
                *last_refill = now;
            }
            Self::FixedWindow {
                interval,
                window_start,
                used,
                ..
            } => {
                let elapsed = now.saturating_duration_since(*window_start);
                if elapsed >= *interval {
                    let intervals = elapsed.as_nanos() / interval.as_nanos();
                    *window_start += *interval * intervals as u32;
                    *used = 0;
                }
            }
        }
    }

    /// Earliest instant this window can grant `weight`. Requires a prior
    /// [`WindowState::sync`] to `now`.
    pub(crate) fn ready_at(&self, weight: u32, now: Instant) -> Instant {
        match self {
            Self::TokenBucket {
                tokens,
                refill_per_sec,
                ..
            } => {
                let deficit = f64::from(weight) - *tokens;
                if deficit <= 0.0 {
                    now
                } else {
                    now + Duration::from_secs_f64(deficit / *refill_per_sec)
                }
            }
            Self::FixedWindow {
                capacity,
                interval,
                window_start,
                used,
            } => {
                if used.saturating_add(weight) <= *capacity {
                    now
                } else {
                    // Callers waiting here compete for the fresh budget at
                    // the boundary rather than being starved.
                    *window_start + *interval
                }
            }
        }
    }

    pub(crate) fn debit(&mut self, weight: u32) {
        match self {
            Self::TokenBucket { tokens, .. } => {
                *tokens -= f64::from(weight);
            }
            Self::FixedWindow { used, .. } => {
                *used += weight;
            }
        }
    }
}
