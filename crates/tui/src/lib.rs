//! # rf-tui
//!
//! Terminal User Interface for reportflow.
//!
//! This crate provides the interactive TUI for picking a workflow and
//! driving its execution. It talks to the tracker in `rf-core` only through
//! channels, using the `Op` and `Event` protocol defined in `rf-protocol`.

pub mod app;
pub mod event;
pub mod event_handler;
pub mod tui;
pub mod widgets;

pub use app::App;
pub use tui::Tui;

use anyhow::Result;
use rf_core::config::models::AppConfig;
use rf_core::executor::HttpExecutor;
use rf_core::tracker::{run_tracker_loop, Tracker};
use rf_protocol::ipc::{Event, Op};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// Run the TUI against the executor named in `config`.
pub async fn launch(config: &AppConfig) -> Result<()> {
    let executor = HttpExecutor::from_config(config)?;
    tracing::info!(base_url = executor.base_url(), "starting TUI");
    let (tracker, events_rx) = Tracker::with_channel(Arc::new(executor), config.tick_interval());
    run_app(tracker, events_rx).await
}

/// Run the TUI over an existing tracker until the user quits.
///
/// The tracker is driven from a spawned op loop; on exit the open session is
/// closed and the loop is awaited.
pub async fn run_app(tracker: Tracker, events_rx: UnboundedReceiver<Event>) -> Result<()> {
    let (op_tx, op_rx) = unbounded_channel();
    let core = tokio::spawn(run_tracker_loop(tracker, op_rx));
    let _ = op_tx.send(Op::ListWorkflows);

    let (mut tui, mut tui_events) = Tui::init()?;
    let mut app = App::new(op_tx.clone(), events_rx);
    let result = app.run(&mut tui, &mut tui_events).await;
    tui.restore()?;

    let _ = op_tx.send(Op::Shutdown);
    if let Err(err) = core.await {
        tracing::warn!(error = %err, "tracker loop ended abnormally");
    }
    result
}
