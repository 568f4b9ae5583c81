//! Shared in-memory fakes for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use vermeer_client::{
    Channel, ChannelId, ChannelKind, Guild, GuildId, Member, Message, MessageId, MessageKind,
    RestApi, UserId,
};
use vermeer_error::{FetchError, FetchErrorKind, FetchResult};

/// In-memory [`RestApi`] backed by hash maps, counting every remote call.
#[derive(Default)]
pub struct MockRest {
    pub guilds: Mutex<HashMap<GuildId, Guild>>,
    pub channels: Mutex<HashMap<ChannelId, Channel>>,
    pub members: Mutex<HashMap<(GuildId, UserId), Member>>,
    pub messages: Mutex<HashMap<ChannelId, Vec<Message>>>,
    pub guild_calls: AtomicUsize,
    pub channel_calls: AtomicUsize,
    pub member_calls: AtomicUsize,
    pub message_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    /// When set, every call fails with a network error.
    pub fail: AtomicBool,
}

impl MockRest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_guild(&self, guild: Guild) {
        self.guilds.lock().unwrap().insert(guild.id, guild);
    }

    pub fn insert_channel(&self, channel: Channel) {
        self.channels.lock().unwrap().insert(channel.id, channel);
    }

    pub fn insert_member(&self, member: Member) {
        self.members
            .lock()
            .unwrap()
            .insert((member.guild_id, member.user_id), member);
    }

    pub fn insert_messages(&self, channel: ChannelId, mut batch: Vec<Message>) {
        batch.sort_by_key(|m| m.id);
        self.messages
            .lock()
            .unwrap()
            .entry(channel)
            .or_default()
            .extend(batch);
    }

    fn check_fail(&self) -> FetchResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(FetchError::new(FetchErrorKind::Network(
                "connection reset".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RestApi for MockRest {
    async fn fetch_guild(&self, id: GuildId) -> FetchResult<Option<Guild>> {
        self.guild_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        Ok(self.guilds.lock().unwrap().get(&id).cloned())
    }

    async fn fetch_channel(&self, id: ChannelId) -> FetchResult<Option<Channel>> {
        self.channel_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        Ok(self.channels.lock().unwrap().get(&id).cloned())
    }

    async fn fetch_member(&self, guild: GuildId, user: UserId) -> FetchResult<Option<Member>> {
        self.member_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        Ok(self.members.lock().unwrap().get(&(guild, user)).cloned())
    }

    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> FetchResult<Option<Message>> {
        self.message_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        Ok(self
            .messages
            .lock()
            .unwrap()
            .get(&channel)
            .and_then(|history| history.iter().find(|m| m.id == message).cloned()))
    }

    async fn fetch_messages(
        &self,
        channel: ChannelId,
        after: Option<MessageId>,
        limit: u8,
    ) -> FetchResult<Vec<Message>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        let messages = self.messages.lock().unwrap();
        let history = messages.get(&channel).cloned().unwrap_or_default();
        Ok(history
            .into_iter()
            .filter(|m| after.is_none_or(|cursor| m.id > cursor))
            .take(limit as usize)
            .collect())
    }
}

pub fn guild(id: u64) -> Guild {
    Guild {
        id: GuildId::new(id),
        name: format!("guild-{id}"),
        icon: None,
        owner_id: UserId::new(1),
        member_count: Some(10),
    }
}

pub fn channel(id: u64) -> Channel {
    Channel {
        id: ChannelId::new(id),
        guild_id: Some(GuildId::new(1)),
        name: Some(format!("channel-{id}")),
        kind: ChannelKind::Text,
    }
}

pub fn member(guild: u64, user: u64, username: &str, nick: Option<&str>) -> Member {
    Member {
        guild_id: GuildId::new(guild),
        user_id: UserId::new(user),
        username: username.to_string(),
        nick: nick.map(str::to_string),
    }
}

pub fn message(channel: u64, id: u64, kind: MessageKind) -> Message {
    Message {
        id: MessageId::new(id),
        channel_id: ChannelId::new(channel),
        author_id: UserId::new(1),
        content: format!("message {id}"),
        kind,
        thread_starter: None,
    }
}
