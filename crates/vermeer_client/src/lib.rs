//! Rate-limited, cached access layer for a Discord-style REST API.
//!
//! This crate sits between a long-lived service and a remote REST API that
//! must not be hammered: every lookup goes through a TTL cache with
//! single-flight loading, every cache miss and page fetch passes a layered
//! rate limiter, and unbounded result sets arrive as lazy cursor-driven
//! streams.
//!
//! # Architecture
//!
//! ## Boundary layer
//! - **rest**: the [`RestApi`] trait the remote HTTP client implements
//! - **gateway**: the [`EventConnection`] trait for the persistent event
//!   stream, plus the [`GatewayEvent`] notifications it emits
//!
//! ## Access layer
//! - **resource**: [`CachedResource`], read-through caching bound to a
//!   rate-limited remote fetch
//! - **pagination**: [`MessagePaginator`], forward-only cursor streaming
//! - **content**: [`ContentResolver`], mention resolution and content
//!   normalization over the member cache
//!
//! ## Lifecycle layer
//! - **lifecycle**: [`ServiceLifecycle`], scoped acquisition of the
//!   connection and caches, event routing, teardown
//!
//! # Usage
//!
//! ```rust,ignore
//! use vermeer_client::{ServiceLifecycle, VermeerConfig};
//!
//! let lifecycle = ServiceLifecycle::new(rest, connection, VermeerConfig::load()?);
//! let handle = lifecycle.acquire().await?;
//! let guild = handle.guild(guild_id).await?;
//! ```

#![warn(missing_docs)]

mod config;
mod content;
mod gateway;
mod lifecycle;
mod models;
mod pagination;
mod resource;
mod rest;

pub use config::{VermeerConfig, VermeerConfigBuilder};
pub use content::{ContentResolver, ResolvedMention, normalize_code_fences};
pub use gateway::{EventConnection, EventStream, GatewayEvent};
pub use lifecycle::{ServiceHandle, ServiceLifecycle, ServiceState};
pub use models::{
    Channel, ChannelId, ChannelKind, Guild, GuildId, Member, MemberKey, Message, MessageId,
    MessageKind, UserId,
};
pub use pagination::MessagePaginator;
pub use resource::CachedResource;
pub use rest::RestApi;
