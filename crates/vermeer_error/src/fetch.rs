//! Errors raised by remote REST fetches.
//!
//! A `FetchError` means the remote call itself failed (network trouble or a
//! non-2xx response). A remote that answers "no such entity" is not a fetch
//! error; that case is modeled as an absent value or [`crate::NotFoundError`].

/// Fetch error variants.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum FetchErrorKind {
    /// Transport-level failure before a response arrived.
    #[display("Network error: {_0}")]
    Network(String),

    /// Remote answered with a non-success status code.
    #[display("Remote returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated by the transport if large.
        body: String,
    },

    /// Response arrived but could not be decoded into the expected shape.
    #[display("Decode error: {_0}")]
    Decode(String),

    /// Remote rejected the call with a 429 despite local limiting.
    ///
    /// The local limiter is tuned to avoid these; seeing one usually means
    /// the configured windows are wider than the remote's actual budget.
    #[display("Remote rate limited the call")]
    RateLimited {
        /// Server-suggested wait before retrying, when provided.
        retry_after_ms: Option<u64>,
    },
}

/// Fetch error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Fetch Error: {} at line {} in {}", kind, line, file)]
pub struct FetchError {
    kind: FetchErrorKind,
    line: u32,
    file: &'static str,
}

impl FetchError {
    /// Create a new fetch error with automatic location tracking.
    ///
    /// # Example
    /// ```
    /// use vermeer_error::{FetchError, FetchErrorKind};
    ///
    /// let err = FetchError::new(FetchErrorKind::Network("connection reset".into()));
    /// assert!(format!("{err}").contains("connection reset"));
    /// ```
    #[track_caller]
    pub fn new(kind: FetchErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FetchErrorKind {
        &self.kind
    }
}

impl<T> From<T> for FetchError
where
    T: Into<FetchErrorKind>,
{
    #[track_caller]
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for remote fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
