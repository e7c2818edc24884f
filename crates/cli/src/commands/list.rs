use crate::ListArgs;
use color_eyre::eyre::Result;
use colored::Colorize;
use rf_core::config::models::AppConfig;
use rf_core::executor::{HttpExecutor, RemoteExecutor};
use rf_protocol::pipeline_models::WorkflowSummary;

pub async fn run(config: &AppConfig, args: &ListArgs) -> Result<()> {
    let executor = HttpExecutor::from_config(config)?;
    let workflows = executor.list_workflows().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&workflows)?);
        return Ok(());
    }

    if workflows.is_empty() {
        println!("{}", "No workflows available.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{:<6} {:<40} {:<8} {:<8} {}",
            "ID", "PIPELINE", "INPUT", "OUTPUT", "LAST RUN"
        )
        .bold()
    );
    for workflow in &workflows {
        println!("{}", format_row(workflow));
    }
    Ok(())
}

fn format_row(w: &WorkflowSummary) -> String {
    format!(
        "{:<6} {:<40} {:<8} {:<8} {}",
        w.id.cyan(),
        w.name,
        w.input.as_deref().unwrap_or("-"),
        w.output.as_deref().unwrap_or("-"),
        w.last_run.as_deref().unwrap_or("-"),
    )
}
