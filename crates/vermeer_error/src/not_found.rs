//! Typed absence: the remote confirmed the entity does not exist.

/// Not-found variants, one per resource the access layer caches.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum NotFoundErrorKind {
    /// Guild (server) not found by ID.
    #[display("Guild not found: {_0}")]
    Guild(u64),

    /// Channel not found by ID.
    #[display("Channel not found: {_0}")]
    Channel(u64),

    /// Member not found within a guild.
    #[display("Member not found: user {user} in guild {guild}")]
    Member {
        /// Guild the lookup ran against.
        guild: u64,
        /// User that was looked up.
        user: u64,
    },

    /// Message not found by ID.
    #[display("Message not found: {_0}")]
    Message(u64),
}

/// Not-found error with source location tracking.
///
/// Distinct from [`crate::FetchError`]: the remote call succeeded and the
/// answer was a definitive absence. Callers typically render this as a
/// graceful "not found" rather than a failure.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Not Found: {} at line {} in {}", kind, line, file)]
pub struct NotFoundError {
    kind: NotFoundErrorKind,
    line: u32,
    file: &'static str,
}

impl NotFoundError {
    /// Create a new not-found error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: NotFoundErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &NotFoundErrorKind {
        &self.kind
    }
}

impl<T> From<T> for NotFoundError
where
    T: Into<NotFoundErrorKind>,
{
    #[track_caller]
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}
