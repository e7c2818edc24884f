//! Standalone TUI binary.
//!
//! Reads `.reportflow/config.toml` from the current directory. Logging is
//! left to the `reportflow` binary.

use anyhow::Result;
use rf_core::config::loader::resolve_config;
use rf_core::config::models::ConfigOverrides;

#[tokio::main]
async fn main() -> Result<()> {
    let root = std::env::current_dir()?;
    let config = resolve_config(&root, None, &ConfigOverrides::default()).await?;
    rf_tui::launch(&config).await
}
