//! TUI application state and event loop.
//!
//! This module defines the main `App` struct that manages the TUI state
//! and the event loop using `tokio::select!`.

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use rf_protocol::ipc::{Event, Op};
use rf_protocol::pipeline_models::WorkflowSummary;
use rf_protocol::session_models::TrackerSnapshot;
use tokio::select;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::event_handler;
use crate::tui::{Tui, TuiEvent};
use crate::widgets;

/// Everything the panels render.
#[derive(Debug, Default)]
pub struct ViewState {
    pub workflows: Vec<WorkflowSummary>,
    pub workflows_error: Option<String>,
    /// Highlighted row of the workflow list.
    pub selected_index: usize,
    /// The open tracker session; `None` shows the workflow list.
    pub session_id: Option<Uuid>,
    pub snapshot: Option<TrackerSnapshot>,
    /// Local message shown above the help line, e.g. a rejected file set.
    pub notice: Option<String>,
    /// The `spec=path` line being typed, while the input is open.
    pub file_input: Option<String>,
}

/// Main TUI application state.
pub struct App {
    pub view: ViewState,
    /// Channel to send operations to the tracker loop.
    pub op_tx: UnboundedSender<Op>,
    /// Channel to receive events from the tracker.
    pub event_rx: UnboundedReceiver<Event>,
    pub should_exit: bool,
}

impl App {
    pub fn new(op_tx: UnboundedSender<Op>, event_rx: UnboundedReceiver<Event>) -> Self {
        Self {
            view: ViewState::default(),
            op_tx,
            event_rx,
            should_exit: false,
        }
    }

    /// Main event loop.
    ///
    /// Uses `tokio::select!` to handle terminal input and tracker events
    /// concurrently. Returns when the user quits or either channel closes.
    pub async fn run(
        &mut self,
        tui: &mut Tui,
        tui_events: &mut UnboundedReceiver<TuiEvent>,
    ) -> Result<()> {
        let frames = tui.frame_requester();
        frames.schedule_frame();

        while !self.should_exit {
            select! {
                Some(event) = self.event_rx.recv() => {
                    self.handle_core_event(event);
                    frames.schedule_frame();
                }
                Some(tui_event) = tui_events.recv() => {
                    match tui_event {
                        TuiEvent::Key(key_event) => {
                            self.handle_key_event(key_event);
                            frames.schedule_frame();
                        }
                        TuiEvent::Paste(text) => {
                            event_handler::handle_paste(&text, &mut self.view);
                            frames.schedule_frame();
                        }
                        TuiEvent::Draw => tui.draw(|frame| self.render(frame))?,
                    }
                }
                else => break,
            }
        }

        Ok(())
    }

    fn handle_core_event(&mut self, event: Event) {
        event_handler::handle_core_event(&mut self.view, event);
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        if event_handler::handle_keyboard_event(key_event, &mut self.view, &self.op_tx) {
            self.should_exit = true;
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        if self.view.session_id.is_some() {
            widgets::render_tracker(
                frame,
                area,
                self.view.snapshot.as_ref(),
                self.view.notice.as_deref(),
                self.view.file_input.as_deref(),
            );
        } else {
            widgets::render_workflow_list(
                frame,
                area,
                &self.view.workflows,
                self.view.selected_index,
                self.view.workflows_error.as_deref(),
            );
        }
    }
}
