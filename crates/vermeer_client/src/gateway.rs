//! The persistent event-connection boundary.
//!
//! The event transport (websocket, message bus) lives outside this crate;
//! an implementation of [`EventConnection`] feeds [`GatewayEvent`]s into
//! the lifecycle layer, which routes them into cache refreshes and
//! invalidations.

use crate::models::{Channel, ChannelId, Guild, GuildId, Member, UserId};
use async_trait::async_trait;
use futures::stream::BoxStream;
use vermeer_error::ConnectionResult;

/// Notifications emitted by the persistent connection.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// The connection is established and the remote accepted the session.
    /// Expected as the first event after [`EventConnection::connect`].
    Ready {
        /// Remote-assigned session identifier.
        session: String,
    },
    /// A guild changed upstream; the cached copy is stale.
    GuildUpdate(Guild),
    /// A channel changed upstream.
    ChannelUpdate(Channel),
    /// A member changed upstream (nickname, roles).
    MemberUpdate(Member),
    /// A guild was deleted or the bot was removed from it.
    GuildDelete(GuildId),
    /// A channel was deleted.
    ChannelDelete(ChannelId),
    /// A member left or was removed from a guild.
    MemberRemove {
        /// Guild the member left.
        guild: GuildId,
        /// The departed user.
        user: UserId,
    },
}

/// Stream of gateway events; ends when the connection drops.
pub type EventStream = BoxStream<'static, GatewayEvent>;

/// Boundary trait for the persistent event connection.
#[async_trait]
pub trait EventConnection: Send + Sync {
    /// Establish the connection and return its event stream.
    ///
    /// The first event on a healthy connection is [`GatewayEvent::Ready`];
    /// the lifecycle layer enforces its own timeout waiting for it.
    async fn connect(&self) -> ConnectionResult<EventStream>;
}
