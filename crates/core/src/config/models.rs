//! Resolved application configuration.
//!
//! `AppConfig` wraps the parsed `config.toml` together with where it came
//! from, and exposes the handful of typed values the rest of the crate needs.

use rf_protocol::config_models::GlobalConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding `api.base-url`.
pub const ENV_API_URL: &str = "REPORTFLOW_API_URL";

/// Environment variable overriding `tracker.tick-interval-ms`.
pub const ENV_TICK_MS: &str = "REPORTFLOW_TICK_MS";

/// Unified application configuration.
///
/// Precedence, highest first: command-line overrides, environment variables,
/// `config.toml`, built-in defaults.
///
/// # Example
///
/// ```rust,no_run
/// use rf_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Executor at {}", config.api_base_url());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Settings from `config.toml` with overrides applied.
    pub global: GlobalConfig,

    /// The file the settings were read from, if any.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub fn api_base_url(&self) -> &str {
        &self.global.api.base_url
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.global.api.timeout_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.global.tracker.tick_interval_ms)
    }

    /// Default log filter directive when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &str {
        &self.global.logging.level
    }

    pub fn log_directory(&self) -> PathBuf {
        PathBuf::from(&self.global.logging.directory)
    }

    /// Apply command-line overrides on top of everything else.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(url) = &overrides.api_url {
            self.global.api.base_url = url.clone();
        }
        if let Some(ms) = overrides.tick_interval_ms {
            self.global.tracker.tick_interval_ms = ms;
        }
        self
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub tick_interval_ms: Option<u64>,
}
