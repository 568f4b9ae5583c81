//! Entity models for the remote API.
//!
//! Snowflake IDs are strictly time-ordered 64-bit integers; the remote
//! serializes them as strings, so the newtypes accept either form on the
//! way in and always emit strings on the way out.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! snowflake {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw snowflake value.
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// The raw snowflake value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct SnowflakeVisitor;

                impl<'de> Visitor<'de> for SnowflakeVisitor {
                    type Value = u64;

                    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        f.write_str("a snowflake ID as a string or integer")
                    }

                    fn visit_u64<E: de::Error>(self, value: u64) -> Result<u64, E> {
                        Ok(value)
                    }

                    fn visit_str<E: de::Error>(self, value: &str) -> Result<u64, E> {
                        value.parse().map_err(de::Error::custom)
                    }
                }

                deserializer.deserialize_any(SnowflakeVisitor).map(Self)
            }
        }
    };
}

snowflake! {
    /// Snowflake ID of a guild (server).
    GuildId
}
snowflake! {
    /// Snowflake ID of a channel.
    ChannelId
}
snowflake! {
    /// Snowflake ID of a user.
    UserId
}
snowflake! {
    /// Snowflake ID of a message. Strictly increasing, usable as a
    /// pagination cursor.
    MessageId
}

/// Cache key for guild members: a member is unique per guild and user.
pub type MemberKey = (GuildId, UserId);

/// A guild (server) on the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    /// Guild snowflake.
    pub id: GuildId,
    /// Guild name.
    pub name: String,
    /// Icon hash, if one is set.
    #[serde(default)]
    pub icon: Option<String>,
    /// Owning user.
    pub owner_id: UserId,
    /// Approximate member count, when the remote reports it.
    #[serde(default)]
    pub member_count: Option<u64>,
}

/// Channel classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChannelKind {
    /// Standard text channel.
    Text,
    /// Voice channel.
    Voice,
    /// Thread hanging off a text channel.
    Thread,
    /// Category grouping other channels.
    Category,
}

/// A channel within a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel snowflake.
    pub id: ChannelId,
    /// Guild the channel belongs to; absent for direct messages.
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    /// Channel name; absent for direct messages.
    #[serde(default)]
    pub name: Option<String>,
    /// Channel classification.
    pub kind: ChannelKind,
}

/// A user's membership within a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Guild this membership belongs to.
    pub guild_id: GuildId,
    /// The member's user snowflake.
    pub user_id: UserId,
    /// Account username.
    pub username: String,
    /// Per-guild nickname, if set.
    #[serde(default)]
    pub nick: Option<String>,
}

impl Member {
    /// The name to show for this member: the guild nickname when set,
    /// otherwise the account username.
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.username)
    }
}

/// Message classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
    /// Ordinary user message.
    Regular,
    /// Reply to another message.
    Reply,
    /// Placeholder referencing the message that started a thread.
    ThreadStarter,
    /// System notification (joins, pins, boosts).
    System,
}

/// A message in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message snowflake; doubles as the pagination cursor.
    pub id: MessageId,
    /// Channel the message was posted in.
    pub channel_id: ChannelId,
    /// Author's user snowflake.
    pub author_id: UserId,
    /// Raw message content.
    pub content: String,
    /// Message classification.
    pub kind: MessageKind,
    /// For thread-starter placeholders, the referenced message.
    #[serde(default)]
    pub thread_starter: Option<MessageId>,
}

impl Message {
    /// Whether this is user-authored content (regular or reply), as
    /// opposed to system noise or a thread-starter placeholder.
    pub fn is_regular(&self) -> bool {
        matches!(self.kind, MessageKind::Regular | MessageKind::Reply)
    }
}
