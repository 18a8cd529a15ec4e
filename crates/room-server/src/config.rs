//! Room server configuration.
//!
//! Configuration is loaded from environment variables, each with a default.
//! Values that parse but make no sense (zero-sized grid, zero keepalive
//! period, a sink cap smaller than one audio chunk) are rejected.

use common::config::ObservabilityConfig;
use room_protocol::frame::AUDIO_CHUNK_BYTES;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default WebSocket bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5000";

/// Default health endpoint bind address.
pub const DEFAULT_HEALTH_BIND_ADDRESS: &str = "0.0.0.0:8081";

/// Default room grid width; spawn x is drawn from `0..=width`.
pub const DEFAULT_GRID_WIDTH: u32 = 100;

/// Default room grid height; spawn y is drawn from `0..=height`.
pub const DEFAULT_GRID_HEIGHT: u32 = 100;

/// Default keepalive probe period in seconds.
pub const DEFAULT_KEEPALIVE_INTERVAL_SECONDS: u64 = 15;

/// Default keepalive acknowledgment timeout in seconds.
pub const DEFAULT_KEEPALIVE_TIMEOUT_SECONDS: u64 = 10;

/// Default per-sink recording cap: five minutes of 48 kHz s16 mono.
pub const DEFAULT_SINK_BUFFER_LIMIT_BYTES: usize = 28_800_000;

/// Default server instance ID prefix.
pub const DEFAULT_SERVER_ID_PREFIX: &str = "rooms";

/// Room server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// WebSocket listener address (default: "0.0.0.0:5000").
    pub bind_address: String,

    /// Health and metrics listener address (default: "0.0.0.0:8081").
    pub health_bind_address: String,

    /// Unique identifier for this server instance, used in logs.
    pub server_id: String,

    /// Spawn bound on the x axis, inclusive.
    pub grid_width: u32,

    /// Spawn bound on the y axis, inclusive.
    pub grid_height: u32,

    /// Seconds between keepalive probes.
    pub keepalive_interval_seconds: u64,

    /// Seconds to wait for a keepalive ack before evicting.
    pub keepalive_timeout_seconds: u64,

    /// Maximum bytes a single sink may record.
    pub sink_buffer_limit_bytes: usize,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            health_bind_address: DEFAULT_HEALTH_BIND_ADDRESS.to_string(),
            server_id: generate_server_id(),
            grid_width: DEFAULT_GRID_WIDTH,
            grid_height: DEFAULT_GRID_HEIGHT,
            keepalive_interval_seconds: DEFAULT_KEEPALIVE_INTERVAL_SECONDS,
            keepalive_timeout_seconds: DEFAULT_KEEPALIVE_TIMEOUT_SECONDS,
            sink_buffer_limit_bytes: DEFAULT_SINK_BUFFER_LIMIT_BYTES,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is present but
    /// unparseable or out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is present but
    /// unparseable or out of range.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("ROOMS_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let health_bind_address = vars
            .get("ROOMS_HEALTH_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_HEALTH_BIND_ADDRESS.to_string());

        let server_id = vars
            .get("ROOMS_SERVER_ID")
            .cloned()
            .unwrap_or_else(generate_server_id);

        let grid_width = parse_var(vars, "ROOMS_GRID_WIDTH", DEFAULT_GRID_WIDTH)?;
        let grid_height = parse_var(vars, "ROOMS_GRID_HEIGHT", DEFAULT_GRID_HEIGHT)?;
        if grid_width == 0 || grid_height == 0 {
            return Err(ConfigError::InvalidValue(format!(
                "room grid must be non-empty, got {grid_width}x{grid_height}"
            )));
        }

        let keepalive_interval_seconds = parse_var(
            vars,
            "ROOMS_KEEPALIVE_INTERVAL_SECONDS",
            DEFAULT_KEEPALIVE_INTERVAL_SECONDS,
        )?;
        let keepalive_timeout_seconds = parse_var(
            vars,
            "ROOMS_KEEPALIVE_TIMEOUT_SECONDS",
            DEFAULT_KEEPALIVE_TIMEOUT_SECONDS,
        )?;
        if keepalive_interval_seconds == 0 || keepalive_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "keepalive interval and timeout must be at least 1 second".to_string(),
            ));
        }

        let sink_buffer_limit_bytes = parse_var(
            vars,
            "ROOMS_SINK_BUFFER_LIMIT_BYTES",
            DEFAULT_SINK_BUFFER_LIMIT_BYTES,
        )?;
        if sink_buffer_limit_bytes < AUDIO_CHUNK_BYTES {
            return Err(ConfigError::InvalidValue(format!(
                "ROOMS_SINK_BUFFER_LIMIT_BYTES must hold at least one {AUDIO_CHUNK_BYTES}-byte chunk"
            )));
        }

        Ok(Config {
            bind_address,
            health_bind_address,
            server_id,
            grid_width,
            grid_height,
            keepalive_interval_seconds,
            keepalive_timeout_seconds,
            sink_buffer_limit_bytes,
            observability: ObservabilityConfig::from_vars(vars),
        })
    }

    /// Keepalive probe period.
    #[must_use]
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_seconds)
    }

    /// Keepalive acknowledgment timeout.
    #[must_use]
    pub fn keepalive_timeout(&self) -> Duration {
        Duration::from_secs(self.keepalive_timeout_seconds)
    }
}

fn parse_var<T: FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{key}={raw}"))),
        None => Ok(default),
    }
}

fn generate_server_id() -> String {
    let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
    let uuid_suffix = uuid::Uuid::new_v4().to_string();
    let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
    format!("{DEFAULT_SERVER_ID_PREFIX}-{hostname}-{short_suffix}")
}
