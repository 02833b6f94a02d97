use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::{ExpiryPolicy, DEFAULT_WINDOW_MINUTES};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub outbox: OutboxSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_window_minutes")]
    pub window_minutes: i64,
    /// Waiting requests older than this are dropped; unset disables expiry
    pub request_ttl_mins: Option<i64>,
    /// Unconfirmed pairs older than this are dropped; unset disables expiry
    pub pending_ttl_mins: Option<i64>,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            window_minutes: default_window_minutes(),
            request_ttl_mins: None,
            pending_ttl_mins: None,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl MatchingSettings {
    /// Matching window; values past the representable range fall back to the default
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::try_minutes(self.window_minutes.max(0)).unwrap_or_else(|| {
            tracing::warn!(
                "matching.window_minutes={} is out of range, using {}",
                self.window_minutes,
                DEFAULT_WINDOW_MINUTES
            );
            crate::core::default_window()
        })
    }

    /// Zero, negative or out-of-range TTLs leave that expiry disabled
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy {
            request_ttl: ttl_minutes("matching.request_ttl_mins", self.request_ttl_mins),
            pending_ttl: ttl_minutes("matching.pending_ttl_mins", self.pending_ttl_mins),
        }
    }
}

fn ttl_minutes(key: &str, minutes: Option<i64>) -> Option<chrono::Duration> {
    let minutes = minutes?;
    let ttl = Some(minutes)
        .filter(|m| *m > 0)
        .and_then(chrono::Duration::try_minutes);
    if ttl.is_none() {
        tracing::warn!("{}={} is not a usable TTL, expiry stays off", key, minutes);
    }
    ttl
}

fn default_window_minutes() -> i64 { DEFAULT_WINDOW_MINUTES }
fn default_sweep_interval_secs() -> u64 { 60 }

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_max_starts")]
    pub max_starts: usize,
    #[serde(default = "default_rate_window_mins")]
    pub window_mins: u64,
    #[serde(default = "default_max_tracked_users")]
    pub max_tracked_users: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_starts: default_max_starts(),
            window_mins: default_rate_window_mins(),
            max_tracked_users: default_max_tracked_users(),
        }
    }
}

fn default_max_starts() -> usize { 3 }
fn default_rate_window_mins() -> u64 { 10 }
fn default_max_tracked_users() -> u64 { 100_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct OutboxSettings {
    #[serde(default = "default_max_per_user")]
    pub max_per_user: usize,
    /// Recipients tracked at once; the least useful queues are evicted beyond this
    #[serde(default = "default_outbox_max_users")]
    pub max_users: u64,
    /// Queues untouched for this long are dropped
    #[serde(default = "default_outbox_idle_mins")]
    pub idle_mins: u64,
}

impl Default for OutboxSettings {
    fn default() -> Self {
        Self {
            max_per_user: default_max_per_user(),
            max_users: default_outbox_max_users(),
            idle_mins: default_outbox_idle_mins(),
        }
    }
}

/// Longest idle period honoured for outbox queues (one year)
const MAX_OUTBOX_IDLE_MINS: u64 = 60 * 24 * 365;

impl OutboxSettings {
    pub fn idle(&self) -> std::time::Duration {
        let minutes = self.idle_mins.clamp(1, MAX_OUTBOX_IDLE_MINS);
        std::time::Duration::from_secs(minutes.saturating_mul(60))
    }
}

fn default_max_per_user() -> usize { 50 }
fn default_outbox_max_users() -> u64 { 100_000 }
fn default_outbox_idle_mins() -> u64 { 60 * 24 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with BONI_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., BONI__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("BONI")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_platform_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("BONI")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Honour the plain `PORT` and `LOG_LEVEL` variables set by container platforms
fn apply_platform_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
        builder = builder.set_override("server.port", port as i64)?;
    }
    if let Ok(level) = env::var("LOG_LEVEL") {
        builder = builder.set_override("logging.level", level)?;
    }

    builder.build()
}
