//! Configuration for the audiotube backend.
//!
//! Configuration is assembled once at start-up from three layers, lowest to
//! highest precedence:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A TOML file: either an explicit path, or `audiotube.toml` inside the
//!    platform configuration directory when it exists.
//! 3. Environment variables prefixed with `AUDIOTUBE_`, using `__` to descend
//!    into sections (e.g. `AUDIOTUBE_AUTH__SECRET_KEY`).
//!
//! The resulting [`Config`] is validated and then passed by reference to every
//! component that needs it. Nothing else in the workspace reads the environment.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;
use time::Duration;

const ENV_PREFIX: &str = "AUDIOTUBE_";
const CONFIG_FILENAME: &str = "audiotube.toml";
const DATABASE_FILENAME: &str = "audiotube.sqlite3";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "audiotube", "audiotube")
}

fn seconds(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub resolver: ResolverConfig,
    pub cache: CacheConfig,
    pub history: HistoryConfig,
    pub signup: SignupConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Public base URL, used to build the links sent by email.
    pub app_url: String,
    /// Mark the session cookie `Secure`. Disable for plain-HTTP development.
    pub secure_cookies: bool,
    /// How often the maintenance task purges tokens and stale cache rows.
    pub maintenance_interval_minutes: u64,
}
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 5050)),
            app_url: "http://localhost:5050".to_string(),
            secure_cookies: true,
            maintenance_interval_minutes: 30,
        }
    }
}
impl ServerConfig {
    pub fn maintenance_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.maintenance_interval_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILENAME))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILENAME));
        Self { path, max_connections: 5, acquire_timeout_secs: 5 }
    }
}
impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for session credentials. Must be set; there is no default.
    pub secret_key: String,
    pub magic_link_ttl_minutes: u64,
    pub session_ttl_days: u64,
}
impl Default for AuthConfig {
    fn default() -> Self {
        Self { secret_key: String::new(), magic_link_ttl_minutes: 15, session_ttl_days: 30 }
    }
}
impl AuthConfig {
    pub fn magic_link_ttl(&self) -> Duration {
        seconds(self.magic_link_ttl_minutes.saturating_mul(60))
    }

    pub fn session_ttl(&self) -> Duration {
        seconds(self.session_ttl_days.saturating_mul(24 * 60 * 60))
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    /// Log magic links instead of sending them.
    #[default]
    Console,
    Resend,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    pub provider: MailProvider,
    pub api_key: Option<String>,
    pub from_address: String,
    pub from_name: String,
    pub timeout_secs: u64,
}
impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: MailProvider::Console,
            api_key: None,
            from_address: "login@localhost".to_string(),
            from_name: "AudioTube".to_string(),
            timeout_secs: 10,
        }
    }
}
impl EmailConfig {
    pub fn timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Explicit path to the `yt-dlp` executable; discovered on `PATH` if unset.
    pub binary: Option<PathBuf>,
    pub search_results: u32,
    pub search_timeout_secs: u64,
    pub metadata_timeout_secs: u64,
    pub stream_timeout_secs: u64,
}
impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            binary: None,
            search_results: 18,
            search_timeout_secs: 30,
            metadata_timeout_secs: 15,
            stream_timeout_secs: 30,
        }
    }
}
impl ResolverConfig {
    pub fn search_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.search_timeout_secs)
    }

    pub fn metadata_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.metadata_timeout_secs)
    }

    pub fn stream_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.stream_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum age of a stream URL that lookups will still return.
    pub freshness_hours: u64,
    /// Maximum age before a stream URL is deleted. Must be at least the freshness window.
    pub retention_hours: u64,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self { freshness_hours: 4, retention_hours: 6 }
    }
}
impl CacheConfig {
    pub fn freshness(&self) -> Duration {
        seconds(self.freshness_hours.saturating_mul(60 * 60))
    }

    pub fn retention(&self) -> Duration {
        seconds(self.retention_hours.saturating_mul(60 * 60))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub limit: u32,
}
impl Default for HistoryConfig {
    fn default() -> Self {
        Self { limit: 50 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignupConfig {
    pub free_tier: u64,
    pub paid_tier: u64,
    pub price: String,
}
impl Default for SignupConfig {
    fn default() -> Self {
        Self { free_tier: 20, paid_tier: 100, price: "$1/month".to_string() }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl Config {
    /// Load, merge and validate configuration from all layers.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path))
    }

    /// Build the layered [`Figment`] without extracting it.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) => figment = figment.merge(Toml::file_exact(path)),
            None => {
                if let Some(dirs) = project_dirs() {
                    let default_path = dirs.config_dir().join(CONFIG_FILENAME);
                    tracing::debug!(path = %default_path.display(), "Looking for configuration file");
                    figment = figment.merge(Toml::file(default_path));
                }
            },
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.secret_key.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("auth.secret_key", "must be set"));
        }
        if self.auth.magic_link_ttl_minutes == 0 {
            exn::bail!(ErrorKind::Invalid("auth.magic_link_ttl_minutes", "must be greater than zero"));
        }
        if self.auth.session_ttl_days == 0 {
            exn::bail!(ErrorKind::Invalid("auth.session_ttl_days", "must be greater than zero"));
        }
        if self.cache.freshness_hours == 0 {
            exn::bail!(ErrorKind::Invalid("cache.freshness_hours", "must be greater than zero"));
        }
        if self.cache.freshness_hours > self.cache.retention_hours {
            exn::bail!(ErrorKind::Invalid("cache.retention_hours", "must not be shorter than the freshness window"));
        }
        if !self.server.app_url.starts_with("http://") && !self.server.app_url.starts_with("https://") {
            exn::bail!(ErrorKind::Invalid("server.app_url", "must be an http(s) URL"));
        }
        if self.server.maintenance_interval_minutes == 0 {
            exn::bail!(ErrorKind::Invalid("server.maintenance_interval_minutes", "must be greater than zero"));
        }
        if self.database.max_connections == 0 {
            exn::bail!(ErrorKind::Invalid("database.max_connections", "must be greater than zero"));
        }
        if self.resolver.search_results == 0 {
            exn::bail!(ErrorKind::Invalid("resolver.search_results", "must be greater than zero"));
        }
        if self.email.provider == MailProvider::Resend && self.email.api_key.as_deref().is_none_or(str::is_empty) {
            exn::bail!(ErrorKind::Invalid("email.api_key", "required by the resend provider"));
        }
        Ok(())
    }
}
