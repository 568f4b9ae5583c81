//! Errors raised while acquiring rate-limit permits.

/// Rate limiting error variants.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RateLimitErrorKind {
    /// A permit was not granted within the configured bound.
    #[display("Permit not acquired within {waited_ms}ms")]
    Timeout {
        /// How long the caller waited before giving up.
        waited_ms: u64,
    },

    /// The requested weight exceeds a window's total capacity, so no
    /// amount of waiting could ever grant it.
    #[display("Requested weight {weight} exceeds window capacity {capacity}")]
    WeightExceedsCapacity {
        /// Weight the caller asked for.
        weight: u32,
        /// Capacity of the narrowest window in the chain.
        capacity: u32,
    },

    /// Limiter configuration was invalid (empty chain, zero capacity).
    #[display("Rate limit configuration error: {_0}")]
    Config(String),
}

/// Rate limiting error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Rate Limit Error: {} at line {} in {}", kind, line, file)]
pub struct RateLimitError {
    kind: RateLimitErrorKind,
    line: u32,
    file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }
}

impl<T> From<T> for RateLimitError
where
    T: Into<RateLimitErrorKind>,
{
    #[track_caller]
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for rate limiting operations.
pub type RateLimitResult<T> = Result<T, RateLimitError>;
