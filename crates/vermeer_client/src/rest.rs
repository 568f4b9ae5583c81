//! The remote REST boundary.
//!
//! The wire protocol lives outside this crate; an HTTP client implements
//! [`RestApi`] and this layer supplies the caching, rate limiting, and
//! pagination on top. A remote 404 is reported as `Ok(None)`, never as an
//! error: callers treat definitive absence as a cache miss.

use crate::models::{Channel, ChannelId, Guild, GuildId, Member, Message, MessageId, UserId};
use async_trait::async_trait;
use vermeer_error::FetchResult;

/// Boundary trait for the remote REST API.
///
/// Implementations are expected to surface transport and non-2xx failures
/// as [`vermeer_error::FetchError`] and to map 404 responses to `Ok(None)`.
/// They should not retry or rate limit; both concerns belong to this layer.
#[async_trait]
pub trait RestApi: Send + Sync {
    /// Fetch a guild by ID.
    async fn fetch_guild(&self, id: GuildId) -> FetchResult<Option<Guild>>;

    /// Fetch a channel by ID.
    async fn fetch_channel(&self, id: ChannelId) -> FetchResult<Option<Channel>>;

    /// Fetch a user's membership in a guild.
    async fn fetch_member(&self, guild: GuildId, user: UserId) -> FetchResult<Option<Member>>;

    /// Fetch a single message by ID.
    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> FetchResult<Option<Message>>;

    /// Fetch up to `limit` messages with IDs strictly greater than `after`
    /// (or from the start of the channel when `after` is `None`), in
    /// ascending ID order.
    async fn fetch_messages(
        &self,
        channel: ChannelId,
        after: Option<MessageId>,
        limit: u8,
    ) -> FetchResult<Vec<Message>>;
}
