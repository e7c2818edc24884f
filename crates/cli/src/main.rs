mod commands;
mod logging;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use logging::LogTarget;
use rf_core::config::loader::resolve_config;
use rf_core::config::models::ConfigOverrides;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reportflow", version, about = "Run report pipelines on a remote executor")]
struct Cli {
    /// Configuration file (default: .reportflow/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Executor base URL, overriding config and environment
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the workflows the executor offers
    List(ListArgs),
    /// Run one workflow to completion
    Run(RunArgs),
    /// Open the terminal UI (the default)
    Tui,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Workflow id
    pub pipeline_id: String,

    /// Advance one step at a time instead of a single full run
    #[arg(long)]
    pub step: bool,

    /// Files for an upload slot; a directory stands for every file in it
    #[arg(long = "file", value_name = "SPEC=PATH")]
    pub files: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        api_url: cli.api_url.clone(),
        ..ConfigOverrides::default()
    };
    let root = std::env::current_dir()?;
    let config = resolve_config(&root, cli.config.as_deref(), &overrides).await?;

    // When `reportflow` is called without a subcommand, launch the TUI
    let command = cli.command.unwrap_or(Command::Tui);
    let target = match command {
        Command::Tui => LogTarget::File,
        Command::List(_) | Command::Run(_) => LogTarget::Stderr,
    };
    logging::init_tracing(&config, target)?;
    tracing::debug!(source = ?config.source, base_url = config.api_base_url(), "configuration loaded");

    match command {
        Command::List(args) => commands::list::run(&config, &args).await,
        Command::Run(args) => {
            let code = commands::run::run(&config, &args).await?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Command::Tui => rf_tui::launch(&config)
            .await
            .map_err(|e| color_eyre::eyre::eyre!(e)),
    }
}
