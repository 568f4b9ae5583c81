//! Errors for the persistent event connection lifecycle.

/// Connection error variants.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ConnectionErrorKind {
    /// Connection could not be established.
    #[display("Connection failed: {_0}")]
    Failed(String),

    /// The remote did not report ready within the configured timeout.
    #[display("Timed out waiting for the connection to become ready")]
    Timeout,

    /// An established connection dropped.
    #[display("Connection dropped: {_0}")]
    Dropped(String),

    /// The service was already shut down when the call arrived.
    #[display("Service is closed")]
    Closed,
}

/// Connection error with source location tracking.
///
/// Fatal to the acquisition attempt that raised it; this layer performs no
/// automatic reconnect, the process owner decides retry policy.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Connection Error: {} at line {} in {}", kind, line, file)]
pub struct ConnectionError {
    kind: ConnectionErrorKind,
    line: u32,
    file: &'static str,
}

impl ConnectionError {
    /// Create a new connection error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ConnectionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ConnectionErrorKind {
        &self.kind
    }
}

impl<T> From<T> for ConnectionError
where
    T: Into<ConnectionErrorKind>,
{
    #[track_caller]
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for connection operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;
