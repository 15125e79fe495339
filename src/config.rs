//! Configuration management for Gatekeeper.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderName;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{GatekeeperError, Result};
use crate::ratelimit::LimitPolicy;

/// Prefix for environment variable overrides, e.g. `GATEKEEPER__LIMITS__MAX_PER_DAY`.
const ENV_PREFIX: &str = "GATEKEEPER";

/// Main configuration for the Gatekeeper service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatekeeperConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Admission limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// HTTP guard configuration
    #[serde(default)]
    pub guard: GuardConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Admission limits. Read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Minimum spacing between accepted requests per endpoint, in milliseconds
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Accepted requests per endpoint per hourly window
    #[serde(default = "default_max_per_hour")]
    pub max_per_hour: u64,

    /// Length of the hourly window in seconds
    #[serde(default = "default_hour_window_secs")]
    pub hour_window_secs: u64,

    /// Accepted requests per subject per day
    #[serde(default = "default_max_per_day")]
    pub max_per_day: u64,

    /// Offset from UTC, in minutes, of the zone whose midnight resets the daily window
    #[serde(default)]
    pub reset_utc_offset_minutes: i32,

    /// Time between eviction sweeps in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            max_per_hour: default_max_per_hour(),
            hour_window_secs: default_hour_window_secs(),
            max_per_day: default_max_per_day(),
            reset_utc_offset_minutes: 0,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_cooldown_ms() -> u64 {
    3000
}

fn default_max_per_hour() -> u64 {
    30
}

fn default_hour_window_secs() -> u64 {
    3600
}

fn default_max_per_day() -> u64 {
    100
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

impl LimitsConfig {
    /// Build the validated policy for the admission controller.
    pub fn policy(&self) -> Result<LimitPolicy> {
        let daily_reset_zone = self
            .reset_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                GatekeeperError::Config(format!(
                    "reset_utc_offset_minutes out of range: {}",
                    self.reset_utc_offset_minutes
                ))
            })?;

        let policy = LimitPolicy {
            cooldown: chrono::Duration::milliseconds(to_i64(self.cooldown_ms, "cooldown_ms")?),
            max_per_hour: self.max_per_hour,
            hour_window: chrono::Duration::seconds(to_i64(
                self.hour_window_secs,
                "hour_window_secs",
            )?),
            max_per_day: self.max_per_day,
            daily_reset_zone,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn to_i64(value: u64, field: &str) -> Result<i64> {
    // chrono durations cap out well below i64::MAX milliseconds.
    const MAX: u64 = i64::MAX as u64 / 1_000_000;
    if value > MAX {
        return Err(GatekeeperError::Config(format!("{} is too large: {}", field, value)));
    }
    Ok(value as i64)
}

/// HTTP guard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Request header carrying the caller identity
    #[serde(default = "default_subject_header")]
    pub subject_header: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            subject_header: default_subject_header(),
        }
    }
}

fn default_subject_header() -> String {
    "x-subject-id".to_string()
}

impl GuardConfig {
    pub fn header_name(&self) -> Result<HeaderName> {
        HeaderName::from_bytes(self.subject_header.as_bytes()).map_err(|e| {
            GatekeeperError::Config(format!(
                "invalid subject_header {:?}: {}",
                self.subject_header, e
            ))
        })
    }
}

impl GatekeeperConfig {
    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| GatekeeperError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from an optional file, overlaid with
    /// `GATEKEEPER__SECTION__FIELD` environment variables, and validate it.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path));
        }

        let config: GatekeeperConfig = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check every value that would otherwise fail later at runtime.
    pub fn validate(&self) -> Result<()> {
        self.limits.policy()?;
        if self.limits.sweep_interval_secs == 0 {
            return Err(GatekeeperError::Config(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        self.guard.header_name()?;
        Ok(())
    }
}
