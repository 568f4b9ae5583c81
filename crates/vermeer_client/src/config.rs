//! Top-level configuration.
//!
//! Loads from TOML with a precedence system:
//! - Bundled defaults (include_str! from vermeer.toml)
//! - User override (~/.config/vermeer/vermeer.toml, then ./vermeer.toml)

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use vermeer_cache::{CacheConfig, CacheConfigBuilder};
use vermeer_error::{ConfigError, ConfigErrorKind, ConfigResult};
use vermeer_rate_limit::RateLimitConfig;

/// Top-level configuration for the service layer.
///
/// # Example
///
/// ```no_run
/// use vermeer_client::VermeerConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Bundled defaults + user overrides
/// let config = VermeerConfig::load()?;
/// println!("Guild TTL: {:?}", config.guild_cache().ttl());
/// # Ok(())
/// # }
/// ```
#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct VermeerConfig {
    /// Guild cache settings.
    #[serde(default)]
    #[builder(default)]
    guild_cache: CacheConfig,

    /// Channel cache settings.
    #[serde(default)]
    #[builder(default)]
    channel_cache: CacheConfig,

    /// Member cache settings. Members churn faster than guilds or
    /// channels, so the default TTL is shorter.
    #[serde(default = "default_member_cache")]
    #[builder(default = "default_member_cache()")]
    member_cache: CacheConfig,

    /// Rate-limit window chain shared by every remote call.
    #[serde(default)]
    #[builder(default)]
    rate_limit: RateLimitConfig,

    /// How long to wait for the connection to become ready (milliseconds).
    #[serde(default = "default_connect_timeout_ms")]
    #[builder(default = "default_connect_timeout_ms()")]
    connect_timeout_ms: u64,

    /// Messages requested per pagination page.
    #[serde(default = "default_page_size")]
    #[builder(default = "default_page_size()")]
    page_size: u8,
}

fn default_member_cache() -> CacheConfig {
    CacheConfigBuilder::default()
        .ttl_secs(120)
        .build()
        .expect("member cache defaults are valid")
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_page_size() -> u8 {
    100
}

impl Default for VermeerConfig {
    fn default() -> Self {
        Self {
            guild_cache: CacheConfig::default(),
            channel_cache: CacheConfig::default(),
            member_cache: default_member_cache(),
            rate_limit: RateLimitConfig::default(),
            connect_timeout_ms: default_connect_timeout_ms(),
            page_size: default_page_size(),
        }
    }
}

impl VermeerConfig {
    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ConfigResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ConfigError::new(ConfigErrorKind::Read(format!(
                    "{}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| ConfigError::new(ConfigErrorKind::Parse(e.to_string())))
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override
    /// earlier):
    /// 1. Bundled defaults (vermeer.toml shipped with the library)
    /// 2. User config in home directory (~/.config/vermeer/vermeer.toml)
    /// 3. User config in current directory (./vermeer.toml)
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> ConfigResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        // Bundled default configuration
        const DEFAULT_CONFIG: &str = include_str!("../vermeer.toml");

        let mut builder = Config::builder()
            // Start with bundled defaults
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        // Add user config from home directory (optional)
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/vermeer/vermeer.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        // Add user config from current directory (optional, highest precedence)
        builder = builder.add_source(File::with_name("vermeer").required(false));

        builder
            .build()
            .map_err(|e| ConfigError::new(ConfigErrorKind::Read(e.to_string())))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(ConfigErrorKind::Parse(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_parse() {
        let config = VermeerConfig::load().expect("bundled defaults should load");
        assert_eq!(config.member_cache().ttl(), Duration::from_secs(120));
        assert_eq!(*config.page_size(), 100);
    }

    #[test]
    fn defaults_match_bundled_file() {
        let config = VermeerConfig::default();
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.guild_cache().ttl(), Duration::from_secs(300));
    }
}
