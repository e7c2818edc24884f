//! Global configuration models for `.reportflow/config.toml`.
//!
//! This module defines the structure of the configuration file that controls
//! how reportflow reaches the Remote Executor and how the tracker behaves.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

/// Default executor base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Default interval of the visual progress ticker during a full run.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 400;

/// Default request timeout. Full runs are synchronous on the executor side
/// and can take minutes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Represents global settings from `.reportflow/config.toml`.
///
/// Every section and key is optional.
///
/// # Example
///
/// ```toml
/// # .reportflow/config.toml
/// [api]
/// base-url = "http://reports.internal:8000/api"
/// timeout-secs = 120
///
/// [tracker]
/// tick-interval-ms = 250
///
/// [logging]
/// level = "debug"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the Remote Executor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Tracker behaviour.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct TrackerConfig {
    /// Milliseconds between visual progress ticks while a full run is in
    /// flight.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Log output settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for the log file written while the TUI owns the terminal.
    #[serde(default = "default_log_directory")]
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    ".reportflow/logs".to_string()
}
