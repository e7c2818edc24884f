//! Configuration file loader for the `.reportflow/` directory.
//!
//! Settings are resolved in layers:
//! - built-in defaults
//! - `.reportflow/config.toml` (or an explicit file)
//! - `REPORTFLOW_API_URL` / `REPORTFLOW_TICK_MS`
//! - command-line overrides

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::{AppConfig, ConfigOverrides, ENV_API_URL, ENV_TICK_MS};
use rf_protocol::config_models::GlobalConfig;
use std::path::Path;
use std::path::PathBuf;

/// Name of the project directory holding reportflow settings.
pub const CONFIG_DIR: &str = ".reportflow";

/// Loads configuration from `<root>/.reportflow/config.toml`.
///
/// Environment overrides are applied on top of the file.
///
/// # Returns
///
/// An `AppConfig` with defaults for everything the file does not set. A
/// missing directory or file is not an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file is not valid TOML or has wrongly-typed keys
/// - A value (from the file or the environment) is out of range
///
/// # Example
///
/// ```rust,no_run
/// use rf_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Ticking every {:?}", config.tick_interval());
/// # Ok(())
/// # }
/// ```
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let config_path = root.join(CONFIG_DIR).join("config.toml");

    // No config.toml: defaults plus environment
    let config = if config_path.exists() {
        load_config_file(&config_path)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Resolves the configuration the binaries run with.
///
/// An explicit `--config` path must exist; otherwise the project directory
/// under `root` is used. Command-line overrides win over everything.
///
/// # Errors
///
/// See [`load_config`].
pub async fn resolve_config(
    root: &Path,
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> ConfigResult<AppConfig> {
    let config = match explicit {
        Some(path) => {
            let config = load_config_file(path)?;
            apply_env_overrides(config, |key| std::env::var(key).ok())?
        }
        None => load_config(root).await?,
    };

    let config = config.with_overrides(overrides);
    validate(&config.global, Path::new("command line"))?;
    Ok(config)
}

/// Loads and validates a single TOML file.
pub fn load_config_file(path: &Path) -> ConfigResult<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let global: GlobalConfig = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;

    validate(&global, path)?;

    Ok(AppConfig {
        global,
        source: Some(path.to_path_buf()),
    })
}

/// Applies environment overrides, reading variables through `lookup`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidConfig` naming the variable when its value
/// cannot be used.
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> ConfigResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
        config.global.api.base_url = url.trim().to_string();
    }

    if let Some(raw) = lookup(ENV_TICK_MS) {
        let ms = raw
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidConfig {
                path: PathBuf::from(ENV_TICK_MS),
                reason: format!("expected milliseconds, got {raw:?}: {e}"),
            })?;
        config.global.tracker.tick_interval_ms = ms;
    }

    validate(&config.global, Path::new("environment"))?;
    Ok(config)
}

fn validate(global: &GlobalConfig, origin: &Path) -> ConfigResult<()> {
    let invalid = |reason: String| ConfigError::InvalidConfig {
        path: origin.to_path_buf(),
        reason,
    };

    let url = global.api.base_url.as_str();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(invalid(format!(
            "api.base-url must be an http(s) URL, got {url:?}"
        )));
    }
    if global.tracker.tick_interval_ms == 0 {
        return Err(invalid("tracker.tick-interval-ms must be positive".to_string()));
    }
    if global.api.timeout_secs == 0 {
        return Err(invalid("api.timeout-secs must be positive".to_string()));
    }
    Ok(())
}
