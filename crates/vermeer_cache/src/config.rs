//! Cache configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What resets an entry's expiry clock.
///
/// Exactly one policy is bound per cache instance at construction and never
/// changes afterwards.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvictionPolicy {
    /// The clock resets only on writes. Reads do not extend an entry's
    /// life, so a value refreshed by external invalidation events stays
    /// exactly as fresh as its last write.
    #[default]
    ActivityBased,
    /// The clock resets on every read, keeping hot entries alive.
    UsageBased,
}

/// Configuration for a [`crate::TtlCache`].
#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct CacheConfig {
    /// TTL for cached entries (seconds).
    #[serde(default = "default_ttl")]
    #[builder(default = "default_ttl()")]
    ttl_secs: u64,

    /// Maximum number of entries; least-recently-used entries are evicted
    /// once the cache is full, independent of TTL. `None` means unbounded.
    #[serde(default)]
    #[builder(default)]
    capacity: Option<usize>,

    /// Eviction policy deciding what resets the expiry clock.
    #[serde(default)]
    #[builder(default)]
    policy: EvictionPolicy,

    /// Whether caching is enabled. When disabled every read misses and
    /// every load goes to the remote (still deduplicated per key).
    #[serde(default = "default_enabled")]
    #[builder(default = "default_enabled()")]
    enabled: bool,
}

fn default_ttl() -> u64 {
    300 // 5 minutes
}

fn default_enabled() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            capacity: None,
            policy: EvictionPolicy::default(),
            enabled: default_enabled(),
        }
    }
}

impl CacheConfig {
    /// TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
