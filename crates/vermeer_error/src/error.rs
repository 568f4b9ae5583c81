//! Top-level error wrapper types.

use crate::{ConfigError, ConnectionError, FetchError, NotFoundError, RateLimitError};

/// Aggregate error kind covering every failure domain in the access layer.
///
/// # Examples
///
/// ```
/// use vermeer_error::{FetchError, FetchErrorKind, VermeerError};
///
/// let fetch = FetchError::new(FetchErrorKind::Network("reset".into()));
/// let err: VermeerError = fetch.into();
/// assert!(format!("{err}").contains("Fetch Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VermeerErrorKind {
    /// Remote call failed (network or non-2xx).
    #[from(FetchError)]
    Fetch(FetchError),
    /// Remote confirmed the entity is absent.
    #[from(NotFoundError)]
    NotFound(NotFoundError),
    /// Rate-limit permit acquisition failed.
    #[from(RateLimitError)]
    RateLimit(RateLimitError),
    /// Persistent connection failed to establish or dropped.
    #[from(ConnectionError)]
    Connection(ConnectionError),
    /// Configuration failed to load.
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Vermeer error with kind discrimination.
///
/// # Examples
///
/// ```
/// use vermeer_error::{ConnectionError, ConnectionErrorKind, VermeerResult};
///
/// fn might_fail() -> VermeerResult<()> {
///     Err(ConnectionError::new(ConnectionErrorKind::Timeout))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Vermeer Error: {}", _0)]
pub struct VermeerError(Box<VermeerErrorKind>);

impl VermeerError {
    /// Create a new error from a kind.
    pub fn new(kind: VermeerErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VermeerErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to VermeerErrorKind
impl<T> From<T> for VermeerError
where
    T: Into<VermeerErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for access-layer operations.
pub type VermeerResult<T> = std::result::Result<T, VermeerError>;
