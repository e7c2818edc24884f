//! Tracing setup for the `reportflow` binary.

use color_eyre::eyre::{eyre, Result, WrapErr};
use rf_core::config::models::AppConfig;
use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// A file under the configured log directory; the terminal belongs to
    /// the UI.
    File,
}

/// `RUST_LOG` when set, otherwise the configured level.
fn build_filter(config: &AppConfig) -> Result<EnvFilter> {
    match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => Ok(EnvFilter::from_default_env()),
        _ => EnvFilter::try_new(config.log_level())
            .map_err(|e| eyre!("invalid log level {:?}: {e}", config.log_level())),
    }
}

pub fn init_tracing(config: &AppConfig, target: LogTarget) -> Result<()> {
    let filter = build_filter(config)?;

    match target {
        LogTarget::Stderr => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal());
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogTarget::File => {
            let dir = config.log_directory();
            std::fs::create_dir_all(&dir)
                .wrap_err_with(|| format!("create log dir {} failed", dir.display()))?;
            let file_name = format!("reportflow.{}.log", std::process::id());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let _ = LOG_GUARD.set(guard);

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }

    Ok(())
}
