//! Configuration types for social-archiver

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Smallest accepted check interval (10 minutes)
pub const MIN_CHECK_INTERVAL_SECS: u64 = 600;

/// Largest accepted check interval (2 hours)
pub const MAX_CHECK_INTERVAL_SECS: u64 = 7200;

/// Largest accepted `retry.backoff_multiplier`
pub const MAX_BACKOFF_MULTIPLIER: f64 = 10.0;

/// Scheduler settings
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SchedulerConfig {
    /// Seconds between automatic check cycles (default: 1800, range 600..=7200)
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,

    /// Switch automatic monitoring on as soon as the archiver is created (default: false)
    #[serde(default)]
    pub start_on_launch: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: default_check_interval(),
            start_on_launch: false,
        }
    }
}

/// Event log settings
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LogConfig {
    /// Maximum number of log entries kept in memory (default: 1000)
    ///
    /// Oldest entries are evicted first once the cap is reached.
    #[serde(default = "default_log_retention")]
    pub log_retention_count: usize,

    /// Buffer size of the event broadcast channel (default: 1000)
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_retention_count: default_log_retention(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Retry configuration for transient download/upload failures
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 2 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff, between 1.0 and 10.0 (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Retry policy that never retries (first failure is final)
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }
}

/// Media download and local archive settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ArchiveConfig {
    /// Root directory for [`LocalDirSink`](crate::sink::LocalDirSink) (default: "./archive")
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Timeout for a single media download (default: 60 seconds)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    pub fetch_timeout: Duration,

    /// User-Agent sent with media downloads
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Largest media body accepted, in bytes (default: 512 MiB)
    #[serde(default = "default_max_media_bytes")]
    pub max_media_bytes: u64,

    /// Directory `file://` media references may be read from (default: none, so
    /// `file://` references are refused)
    #[serde(default)]
    pub local_media_root: Option<PathBuf>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_dir: default_archive_dir(),
            fetch_timeout: default_fetch_timeout(),
            user_agent: default_user_agent(),
            max_media_bytes: default_max_media_bytes(),
            local_media_root: None,
        }
    }
}

/// API and external server integration settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for [`Archiver`](crate::Archiver)
///
/// The scheduler, log and server sub-configs are flattened, so the JSON shape keeps the
/// recognized options at the top level:
///
/// ```json
/// {
///   "check_interval_seconds": 1800,
///   "log_retention_count": 1000,
///   "accounts": ["natgeo", "@nasa"]
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Scheduler settings
    #[serde(flatten)]
    pub scheduler: SchedulerConfig,

    /// Event log settings
    #[serde(flatten)]
    pub log: LogConfig,

    /// Handles to monitor from startup (leading `@` allowed)
    #[serde(default)]
    pub accounts: Vec<String>,

    /// Per-item download/upload retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Media download and local archive settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// API and external server integration
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Parse a configuration from JSON and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        validate_interval(self.scheduler.check_interval_seconds)?;

        if self.log.log_retention_count == 0 {
            return Err(Error::Config {
                message: "log_retention_count must be at least 1".into(),
                key: Some("log_retention_count".into()),
            });
        }

        if self.log.event_channel_capacity == 0 {
            return Err(Error::Config {
                message: "event_channel_capacity must be at least 1".into(),
                key: Some("event_channel_capacity".into()),
            });
        }

        // Also rejects NaN and infinity
        if !(1.0..=MAX_BACKOFF_MULTIPLIER).contains(&self.retry.backoff_multiplier) {
            return Err(Error::Config {
                message: format!(
                    "retry.backoff_multiplier must be between 1.0 and {}, got {}",
                    MAX_BACKOFF_MULTIPLIER, self.retry.backoff_multiplier
                ),
                key: Some("retry.backoff_multiplier".into()),
            });
        }

        if self.archive.max_media_bytes == 0 {
            return Err(Error::Config {
                message: "archive.max_media_bytes must be at least 1".into(),
                key: Some("archive.max_media_bytes".into()),
            });
        }

        Ok(())
    }
}

/// Reject intervals outside `MIN_CHECK_INTERVAL_SECS..=MAX_CHECK_INTERVAL_SECS`
pub fn validate_interval(seconds: u64) -> Result<u64> {
    if (MIN_CHECK_INTERVAL_SECS..=MAX_CHECK_INTERVAL_SECS).contains(&seconds) {
        Ok(seconds)
    } else {
        Err(Error::InvalidInterval {
            seconds,
            min: MIN_CHECK_INTERVAL_SECS,
            max: MAX_CHECK_INTERVAL_SECS,
        })
    }
}

fn default_check_interval() -> u64 {
    1800
}

fn default_log_retention() -> usize {
    1000
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("./archive")
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_user_agent() -> String {
    concat!("social-archiver/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_media_bytes() -> u64 {
    512 * 1024 * 1024
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
