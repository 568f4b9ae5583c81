//! Scoped acquisition and release of the connection and caches.

use crate::config::VermeerConfig;
use crate::content::ContentResolver;
use crate::gateway::{EventConnection, EventStream, GatewayEvent};
use crate::models::{Channel, ChannelId, Guild, GuildId, Member, MemberKey, UserId};
use crate::pagination::MessagePaginator;
use crate::resource::CachedResource;
use crate::rest::RestApi;
use futures::StreamExt;
use std::sync::{Arc, Mutex as StdMutex, Weak};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use vermeer_error::{
    ConnectionError, ConnectionErrorKind, NotFoundError, NotFoundErrorKind, VermeerResult,
};
use vermeer_rate_limit::RateLimiter;

/// Lifecycle states for the service.
///
/// `Unstarted -> Connecting -> Ready -> (ShuttingDown) -> Closed`. A
/// failed connection attempt goes straight to `Closed`; a later
/// [`ServiceLifecycle::acquire`] starts a fresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ServiceState {
    /// No acquisition attempted yet.
    Unstarted,
    /// Connection attempt in progress.
    Connecting,
    /// Connected; caches live; handles usable.
    Ready,
    /// Explicit shutdown in progress.
    ShuttingDown,
    /// Torn down, either deliberately or by a failure.
    Closed,
}

/// Lifecycle state tagged with the generation that owns it.
///
/// Each connection attempt bumps the generation. Writers born of an older
/// generation (a stale handle's teardown, a finished pump) must not touch
/// the state once a newer generation has taken over.
struct LifecycleState {
    generation: u64,
    state: ServiceState,
}

type SharedState = Arc<StdMutex<LifecycleState>>;

/// Owns the persistent connection, the caches, and the shared rate
/// limiter, handing them out as scoped [`ServiceHandle`]s.
///
/// This value replaces module-level singletons: construct it once with the
/// REST and event-connection collaborators and pass it where needed. Only
/// one `Ready` instance exists per lifecycle value; while it lives,
/// further [`ServiceLifecycle::acquire`] calls return the same handle.
pub struct ServiceLifecycle {
    rest: Arc<dyn RestApi>,
    connection: Arc<dyn EventConnection>,
    config: VermeerConfig,
    state: SharedState,
    // Weak so dropped handles tear down without the lifecycle keeping
    // the service alive; the async mutex serializes concurrent acquires.
    current: Mutex<Weak<ServiceInner>>,
}

impl ServiceLifecycle {
    /// Create a lifecycle over the REST and event-connection boundaries.
    pub fn new(
        rest: Arc<dyn RestApi>,
        connection: Arc<dyn EventConnection>,
        config: VermeerConfig,
    ) -> Self {
        Self {
            rest,
            connection,
            config,
            state: Arc::new(StdMutex::new(LifecycleState {
                generation: 0,
                state: ServiceState::Unstarted,
            })),
            current: Mutex::new(Weak::new()),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServiceState {
        self.state.lock().expect("state lock poisoned").state
    }

    // Only called while holding the `current` lock, so the write always
    // belongs to the newest generation.
    fn set_state(&self, next: ServiceState) {
        self.state.lock().expect("state lock poisoned").state = next;
    }

    /// Acquire a handle to the running service, connecting first if
    /// needed.
    ///
    /// While the service is `Ready` this returns the existing handle. A
    /// fresh attempt connects, waits (bounded by the configured connect
    /// timeout) for the gateway's ready notification, builds the caches,
    /// and starts the event pump. On timeout or rejection the state moves
    /// to `Closed` and the error surfaces to this caller; no automatic
    /// reconnect happens here, retry policy belongs to the process owner.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> VermeerResult<ServiceHandle> {
        let mut current = self.current.lock().await;

        if let Some(inner) = current.upgrade()
            && self.state() == ServiceState::Ready
        {
            return Ok(ServiceHandle { inner });
        }

        // A fresh attempt starts a new generation; stale writers from the
        // previous one lose their claim on the shared state here.
        let generation = {
            let mut shared = self.state.lock().expect("state lock poisoned");
            shared.generation += 1;
            shared.state = ServiceState::Connecting;
            shared.generation
        };
        info!(generation, "Establishing event connection");

        let setup = async {
            let mut events = self.connection.connect().await?;
            loop {
                match events.next().await {
                    Some(GatewayEvent::Ready { session }) => return Ok((session, events)),
                    Some(_) => continue,
                    None => {
                        return Err(ConnectionError::new(ConnectionErrorKind::Failed(
                            "event stream ended before ready".to_string(),
                        )));
                    }
                }
            }
        };
        let (session, events) =
            match tokio::time::timeout(self.config.connect_timeout(), setup).await {
                Err(_) => {
                    self.set_state(ServiceState::Closed);
                    return Err(ConnectionError::new(ConnectionErrorKind::Timeout).into());
                }
                Ok(Err(e)) => {
                    self.set_state(ServiceState::Closed);
                    return Err(e.into());
                }
                Ok(Ok(ready)) => ready,
            };

        info!(session = %session, "Connection ready");
        let inner = Arc::new(ServiceInner::start(
            session,
            Arc::clone(&self.rest),
            events,
            &self.config,
            Arc::clone(&self.state),
            generation,
        )?);
        self.set_state(ServiceState::Ready);

        *current = Arc::downgrade(&inner);
        Ok(ServiceHandle { inner })
    }
}

struct ServiceInner {
    session: String,
    rest: Arc<dyn RestApi>,
    limiter: RateLimiter,
    page_size: u8,
    guilds: CachedResource<GuildId, Guild>,
    channels: CachedResource<ChannelId, Channel>,
    members: CachedResource<MemberKey, Member>,
    resolver: ContentResolver,
    state: SharedState,
    generation: u64,
    pump: StdMutex<Option<JoinHandle<()>>>,
}

impl ServiceInner {
    fn start(
        session: String,
        rest: Arc<dyn RestApi>,
        events: EventStream,
        config: &VermeerConfig,
        state: SharedState,
        generation: u64,
    ) -> VermeerResult<Self> {
        // One limiter for every resource: the remote budget is shared.
        let limiter = RateLimiter::new(config.rate_limit().clone())?;

        let guilds = CachedResource::new("guild", config.guild_cache().clone(), limiter.clone(), {
            let rest = Arc::clone(&rest);
            move |id: GuildId| {
                let rest = Arc::clone(&rest);
                async move { rest.fetch_guild(id).await }
            }
        });
        let channels = CachedResource::new(
            "channel",
            config.channel_cache().clone(),
            limiter.clone(),
            {
                let rest = Arc::clone(&rest);
                move |id: ChannelId| {
                    let rest = Arc::clone(&rest);
                    async move { rest.fetch_channel(id).await }
                }
            },
        );
        let members = CachedResource::new(
            "member",
            config.member_cache().clone(),
            limiter.clone(),
            {
                let rest = Arc::clone(&rest);
                move |(guild, user): MemberKey| {
                    let rest = Arc::clone(&rest);
                    async move { rest.fetch_member(guild, user).await }
                }
            },
        );
        let resolver = ContentResolver::new(members.clone());

        let pump = tokio::spawn(pump_events(
            events,
            guilds.clone(),
            channels.clone(),
            members.clone(),
            Arc::clone(&state),
            generation,
        ));

        Ok(Self {
            session,
            rest,
            limiter,
            page_size: *config.page_size(),
            guilds,
            channels,
            members,
            resolver,
            state,
            generation,
            pump: StdMutex::new(Some(pump)),
        })
    }

    /// Write the shared state, unless a newer generation owns it.
    fn set_state(&self, next: ServiceState) {
        let mut shared = self.state.lock().expect("state lock poisoned");
        if shared.generation == self.generation {
            shared.state = next;
        }
    }

    fn teardown(&self, next: ServiceState) {
        if let Some(pump) = self
            .pump
            .lock()
            .expect("pump lock poisoned")
            .take()
        {
            pump.abort();
        }
        self.guilds.clear();
        self.channels.clear();
        self.members.clear();
        self.set_state(next);
    }
}

impl Drop for ServiceInner {
    fn drop(&mut self) {
        // The pump handle doubles as the torn-down marker; teardown itself
        // only releases this generation's resources, so a stale drop never
        // disturbs a replacement service.
        let torn_down = self.pump.lock().expect("pump lock poisoned").is_none();
        if !torn_down {
            info!("Last handle dropped, tearing down service");
            self.teardown(ServiceState::Closed);
        }
    }
}

/// Route gateway notifications into the caches: entity-changed events
/// re-fetch through the rate limiter, entity-deleted events invalidate
/// locally.
async fn pump_events(
    mut events: EventStream,
    guilds: CachedResource<GuildId, Guild>,
    channels: CachedResource<ChannelId, Channel>,
    members: CachedResource<MemberKey, Member>,
    state: SharedState,
    generation: u64,
) {
    while let Some(event) = events.next().await {
        match event {
            GatewayEvent::Ready { .. } => {}
            GatewayEvent::GuildUpdate(guild) => {
                if let Err(e) = guilds.refresh(guild.id).await {
                    warn!(guild = %guild.id, error = %e, "Guild refresh failed");
                }
            }
            GatewayEvent::ChannelUpdate(channel) => {
                if let Err(e) = channels.refresh(channel.id).await {
                    warn!(channel = %channel.id, error = %e, "Channel refresh failed");
                }
            }
            GatewayEvent::MemberUpdate(member) => {
                let key = (member.guild_id, member.user_id);
                if let Err(e) = members.refresh(key).await {
                    warn!(user = %member.user_id, error = %e, "Member refresh failed");
                }
            }
            GatewayEvent::GuildDelete(id) => guilds.delete(&id),
            GatewayEvent::ChannelDelete(id) => channels.delete(&id),
            GatewayEvent::MemberRemove { guild, user } => members.delete(&(guild, user)),
        }
    }

    // Stream exhausted: the connection dropped out from under us.
    let mut shared = state.lock().expect("state lock poisoned");
    if shared.generation == generation && shared.state == ServiceState::Ready {
        warn!("Event connection dropped");
        shared.state = ServiceState::Closed;
    }
}

/// Cloneable handle to the running service.
///
/// All clones share the caches, the limiter, and the event pump. The
/// service tears down when [`ServiceHandle::shutdown`] is called or the
/// last handle is dropped.
#[derive(Clone)]
pub struct ServiceHandle {
    inner: Arc<ServiceInner>,
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl ServiceHandle {
    /// Session identifier assigned by the remote at connect time.
    pub fn session(&self) -> &str {
        &self.inner.session
    }

    /// Current lifecycle state.
    ///
    /// A handle left over from a superseded connection reports `Closed`
    /// even though the lifecycle itself may be `Ready` again.
    pub fn state(&self) -> ServiceState {
        let shared = self.inner.state.lock().expect("state lock poisoned");
        if shared.generation == self.inner.generation {
            shared.state
        } else {
            ServiceState::Closed
        }
    }

    /// The guild cache.
    pub fn guilds(&self) -> &CachedResource<GuildId, Guild> {
        &self.inner.guilds
    }

    /// The channel cache.
    pub fn channels(&self) -> &CachedResource<ChannelId, Channel> {
        &self.inner.channels
    }

    /// The member cache.
    pub fn members(&self) -> &CachedResource<MemberKey, Member> {
        &self.inner.members
    }

    /// The content resolver over the member cache.
    pub fn resolver(&self) -> &ContentResolver {
        &self.inner.resolver
    }

    /// A paginator over one channel's messages, sharing the service's
    /// rate-limit budget.
    pub fn paginator(&self, channel: ChannelId) -> MessagePaginator {
        MessagePaginator::new(
            Arc::clone(&self.inner.rest),
            self.inner.limiter.clone(),
            channel,
        )
        .with_page_size(self.inner.page_size)
    }

    /// Get a guild, treating confirmed absence as [`NotFoundError`].
    pub async fn guild(&self, id: GuildId) -> VermeerResult<Guild> {
        match self.inner.guilds.get(id).await? {
            Some(guild) => Ok(guild),
            None => Err(NotFoundError::new(NotFoundErrorKind::Guild(id.get())).into()),
        }
    }

    /// Get a channel, treating confirmed absence as [`NotFoundError`].
    pub async fn channel(&self, id: ChannelId) -> VermeerResult<Channel> {
        match self.inner.channels.get(id).await? {
            Some(channel) => Ok(channel),
            None => Err(NotFoundError::new(NotFoundErrorKind::Channel(id.get())).into()),
        }
    }

    /// Get a member, treating confirmed absence as [`NotFoundError`].
    pub async fn member(&self, guild: GuildId, user: UserId) -> VermeerResult<Member> {
        match self.inner.members.get((guild, user)).await? {
            Some(member) => Ok(member),
            None => Err(NotFoundError::new(NotFoundErrorKind::Member {
                guild: guild.get(),
                user: user.get(),
            })
            .into()),
        }
    }

    /// Tear the service down: stop the event pump, drop the caches, and
    /// move to `Closed`. Affects every clone of this handle.
    #[instrument(skip(self))]
    pub fn shutdown(&self) {
        info!("Shutting down service");
        self.inner.teardown(ServiceState::ShuttingDown);
        self.inner.set_state(ServiceState::Closed);
    }
}
