//! Error types for the Vermeer API access layer.
//!
//! Each failure domain gets a kind enum plus a wrapper struct that records
//! the file and line where the error was raised. The wrappers are `Clone`
//! so a single failed load can be handed to every caller awaiting it.

#![warn(missing_docs)]

mod config;
mod connection;
mod error;
mod fetch;
mod not_found;
mod rate_limit;

pub use config::{ConfigError, ConfigErrorKind, ConfigResult};
pub use connection::{ConnectionError, ConnectionErrorKind, ConnectionResult};
pub use error::{VermeerError, VermeerErrorKind, VermeerResult};
pub use fetch::{FetchError, FetchErrorKind, FetchResult};
pub use not_found::{NotFoundError, NotFoundErrorKind};
pub use rate_limit::{RateLimitError, RateLimitErrorKind, RateLimitResult};
