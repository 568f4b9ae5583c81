//! Vermeer - cached, rate-limited access to a Discord-style API.
//!
//! Vermeer sits between a long-lived service and a remote chat platform's
//! REST API. It keeps the remote from being hammered and the local view
//! fresh: reads go through TTL caches with single-flight loading, misses
//! pass a layered rate limiter, unbounded message history arrives as lazy
//! cursor-driven streams, and a persistent event connection keeps the
//! caches coherent.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vermeer::{ServiceLifecycle, VermeerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     vermeer::init_telemetry()?;
//!
//!     // `rest` and `connection` implement the RestApi and
//!     // EventConnection boundary traits for your transport.
//!     let lifecycle = ServiceLifecycle::new(rest, connection, VermeerConfig::load()?);
//!     let handle = lifecycle.acquire().await?;
//!
//!     let guild = handle.guild(guild_id).await?;
//!     println!("Connected to {}", guild.name);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Vermeer is organized as a workspace with focused crates:
//!
//! - `vermeer_error` - Error types with source location tracking
//! - `vermeer_cache` - TTL caching with single-flight loading
//! - `vermeer_rate_limit` - Layered rate limiting and retry
//! - `vermeer_client` - Models, boundary traits, and the access layer
//!
//! This crate (`vermeer`) re-exports everything for convenience.

#![warn(missing_docs)]

mod telemetry;

pub use telemetry::init_telemetry;
pub use vermeer_cache::{CacheConfig, CacheConfigBuilder, CacheEntry, EvictionPolicy, TtlCache};
pub use vermeer_client::{
    CachedResource, Channel, ChannelId, ChannelKind, ContentResolver, EventConnection,
    EventStream, GatewayEvent, Guild, GuildId, Member, MemberKey, Message, MessageId,
    MessageKind, MessagePaginator, ResolvedMention, RestApi, ServiceHandle, ServiceLifecycle,
    ServiceState, UserId, VermeerConfig, VermeerConfigBuilder, normalize_code_fences,
};
pub use vermeer_error::{
    ConfigError, ConfigErrorKind, ConfigResult, ConnectionError, ConnectionErrorKind,
    ConnectionResult, FetchError, FetchErrorKind, FetchResult, NotFoundError, NotFoundErrorKind,
    RateLimitError, RateLimitErrorKind, RateLimitResult, VermeerError, VermeerErrorKind,
    VermeerResult,
};
pub use vermeer_rate_limit::{
    RateLimitConfig, RateLimitConfigBuilder, RateLimiter, RateLimiterGuard, RetryableError,
    WindowAlgorithm, WindowConfig,
};
