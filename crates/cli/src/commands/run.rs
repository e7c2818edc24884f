//! `reportflow run`: drive one workflow from the command line.
//!
//! The command uses the same tracker as the TUI. It follows the tracker's
//! snapshot events, prints each step as the cursor reaches it, and returns
//! the process exit code.

use crate::RunArgs;
use color_eyre::eyre::{bail, eyre, Result};
use colored::Colorize;
use rf_core::config::models::AppConfig;
use rf_core::executor::HttpExecutor;
use rf_core::inputs;
use rf_core::tracker::Tracker;
use rf_protocol::ipc::Event;
use rf_protocol::session_models::{CommandOutcome, SessionStatus, TrackerSnapshot};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

pub async fn run(config: &AppConfig, args: &RunArgs) -> Result<i32> {
    let files = inputs::collect_assignments(&args.files).map_err(|e| eyre!("{e:#}"))?;
    let executor = HttpExecutor::from_config(config)?;
    let (tracker, mut events) = Tracker::with_channel(Arc::new(executor), config.tick_interval());

    let session_id = tracker.open(&args.pipeline_id).await;
    let outcome = drive(&tracker, &mut events, session_id, args.step, files).await;
    tracker.shutdown().await;
    outcome
}

async fn drive(
    tracker: &Tracker,
    events: &mut UnboundedReceiver<Event>,
    session_id: Uuid,
    step_mode: bool,
    files: BTreeMap<String, Vec<PathBuf>>,
) -> Result<i32> {
    let mut progress = ProgressPrinter::default();

    let mut snapshot = loop {
        let snapshot = next_snapshot(events, session_id).await?;
        if snapshot.status != SessionStatus::Loading {
            break snapshot;
        }
    };
    println!(
        "{} {} ({} steps)",
        "Pipeline".bold(),
        snapshot.pipeline_id,
        snapshot.steps.len()
    );

    if snapshot.status == SessionStatus::RequestingFiles {
        record_files(tracker, &snapshot, files).await?;
    } else if !files.is_empty() {
        tracing::warn!("pipeline does not request files; ignoring --file");
    }

    loop {
        progress.show(&snapshot);
        match snapshot.status {
            SessionStatus::Success => {
                let artifacts = snapshot
                    .result
                    .as_ref()
                    .map(|r| r.artifacts.clone())
                    .unwrap_or_default();
                println!("{}", "Pipeline finished".green().bold());
                for artifact in artifacts {
                    println!("  {} {artifact}", "artifact:".cyan());
                }
                return Ok(0);
            }
            SessionStatus::Error => {
                let message = snapshot
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unknown error".to_string());
                eprintln!("{} {message}", "Pipeline failed:".red().bold());
                return Ok(1);
            }
            _ => {
                let outcome = if step_mode {
                    tracker.advance_one_step().await
                } else {
                    tracker.run_all().await
                };
                match outcome {
                    CommandOutcome::Started => {}
                    CommandOutcome::Rejected(error) => return Err(error.into()),
                    CommandOutcome::Ignored => {
                        bail!("tracker ignored the command in state {}", snapshot.status)
                    }
                }
                snapshot = settle(events, session_id, &mut progress).await?;
            }
        }
    }
}

async fn record_files(
    tracker: &Tracker,
    snapshot: &TrackerSnapshot,
    files: BTreeMap<String, Vec<PathBuf>>,
) -> Result<()> {
    for (spec_id, paths) in files {
        match tracker.record_files(&spec_id, paths).await {
            CommandOutcome::Started => {}
            CommandOutcome::Rejected(error) => return Err(error.into()),
            CommandOutcome::Ignored => {
                let known: Vec<&str> = snapshot.file_specs.iter().map(|s| s.id.as_str()).collect();
                bail!(
                    "unknown file slot {spec_id:?}; this pipeline accepts: {}",
                    known.join(", ")
                );
            }
        }
    }
    Ok(())
}

/// Wait for the next snapshot of `session_id`.
async fn next_snapshot(
    events: &mut UnboundedReceiver<Event>,
    session_id: Uuid,
) -> Result<TrackerSnapshot> {
    while let Some(event) = events.recv().await {
        if let Event::SnapshotUpdated { snapshot } = event {
            if snapshot.session_id == session_id {
                return Ok(snapshot);
            }
        }
    }
    bail!("tracker stopped before the pipeline settled")
}

/// Wait until the command just started has settled.
///
/// Snapshots queued before the command (file records, for example) are
/// skipped: the first one that counts follows an `executing` snapshot.
async fn settle(
    events: &mut UnboundedReceiver<Event>,
    session_id: Uuid,
    progress: &mut ProgressPrinter,
) -> Result<TrackerSnapshot> {
    let mut executing = false;
    loop {
        let snapshot = next_snapshot(events, session_id).await?;
        if snapshot.status == SessionStatus::Executing {
            executing = true;
            progress.show(&snapshot);
        } else if executing {
            return Ok(snapshot);
        }
    }
}

/// Prints a line each time the displayed step changes.
#[derive(Default)]
struct ProgressPrinter {
    last: Option<usize>,
}

impl ProgressPrinter {
    fn show(&mut self, snapshot: &TrackerSnapshot) {
        if snapshot.steps.is_empty() || self.last == Some(snapshot.display_index) {
            return;
        }
        self.last = Some(snapshot.display_index);
        if let Some(step) = snapshot.display_step() {
            println!(
                "[{}/{}] {}",
                snapshot.display_index + 1,
                snapshot.steps.len(),
                step.name.label()
            );
        }
    }
}
