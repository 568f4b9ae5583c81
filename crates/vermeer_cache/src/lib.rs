//! TTL caching with single-flight loading.
//!
//! This crate provides the cache layer that every remote resource lookup in
//! Vermeer goes through: values expire after a configurable TTL, concurrent
//! loads for the same key collapse into one underlying call, and an optional
//! capacity bound evicts least-recently-used entries.

#![warn(missing_docs)]

mod cache;
mod config;

pub use cache::{CacheEntry, TtlCache};
pub use config::{CacheConfig, CacheConfigBuilder, EvictionPolicy};
