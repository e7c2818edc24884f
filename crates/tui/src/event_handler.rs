//! Event handling for the TUI.
//!
//! This module provides functions for handling:
//! - Core events (from the tracker loop)
//! - Keyboard events, routed through the file input line, the active view
//!   and the global keys
//! - File assignment submission

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use rf_core::inputs;
use rf_protocol::ipc::{Event, Op};
use tokio::sync::mpsc::UnboundedSender;

use crate::app::ViewState;
use crate::event::EventStatus;

/// Apply an event received from the tracker loop.
pub fn handle_core_event(view: &mut ViewState, event: Event) {
    match event {
        Event::WorkflowsListed { workflows } => {
            view.workflows = workflows;
            view.workflows_error = None;
            view.selected_index = view
                .selected_index
                .min(view.workflows.len().saturating_sub(1));
        }
        Event::WorkflowsUnavailable { message } => {
            view.workflows_error = Some(message);
        }
        Event::SessionOpened { session_id, .. } => {
            view.session_id = Some(session_id);
            view.snapshot = None;
            view.notice = None;
            view.file_input = None;
        }
        Event::SnapshotUpdated { snapshot } => {
            if view.session_id == Some(snapshot.session_id) {
                view.snapshot = Some(snapshot);
            }
        }
        Event::ExecutionCompleted { session_id, .. } => {
            if view.session_id == Some(session_id) {
                view.notice = None;
            }
        }
        Event::ExecutionFailed { session_id, error } => {
            tracing::debug!(%session_id, %error, "execution failed");
        }
        Event::FilesRejected { session_id, error } => {
            if view.session_id == Some(session_id) {
                view.notice = Some(error.to_string());
            }
        }
        Event::SessionClosed { session_id, .. } => {
            if view.session_id == Some(session_id) {
                view.session_id = None;
                view.snapshot = None;
                view.notice = None;
                view.file_input = None;
            }
        }
    }
}

/// Handle a keyboard event from the user.
///
/// Returns `true` if the application should exit.
pub fn handle_keyboard_event(
    key_event: KeyEvent,
    view: &mut ViewState,
    op_tx: &UnboundedSender<Op>,
) -> bool {
    if key_event.kind != KeyEventKind::Press {
        return false;
    }

    if handle_file_input_key(key_event, view, op_tx).is_consumed() {
        return false;
    }

    let status = if view.session_id.is_some() {
        handle_tracker_key(key_event, view, op_tx)
    } else {
        handle_workflow_list_key(key_event, view, op_tx)
    };
    if status.is_consumed() {
        return false;
    }

    key_event.code == KeyCode::Char('q')
}

/// Append pasted text to the file input line, if it is open.
pub fn handle_paste(text: &str, view: &mut ViewState) {
    if let Some(input) = view.file_input.as_mut() {
        input.push_str(text.trim_end_matches(['\r', '\n']));
    }
}

fn handle_file_input_key(
    key_event: KeyEvent,
    view: &mut ViewState,
    op_tx: &UnboundedSender<Op>,
) -> EventStatus {
    let Some(input) = view.file_input.as_mut() else {
        return EventStatus::NotConsumed;
    };

    match key_event.code {
        KeyCode::Char(c) => input.push(c),
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Esc => view.file_input = None,
        KeyCode::Enter => {
            if let Some(raw) = view.file_input.take() {
                submit_file_assignment(&raw, view, op_tx);
            }
        }
        _ => {}
    }
    EventStatus::Consumed
}

fn handle_workflow_list_key(
    key_event: KeyEvent,
    view: &mut ViewState,
    op_tx: &UnboundedSender<Op>,
) -> EventStatus {
    match key_event.code {
        KeyCode::Up => {
            view.selected_index = view.selected_index.saturating_sub(1);
        }
        KeyCode::Down => {
            if view.selected_index < view.workflows.len().saturating_sub(1) {
                view.selected_index += 1;
            }
        }
        KeyCode::Enter => {
            if let Some(workflow) = view.workflows.get(view.selected_index) {
                let _ = op_tx.send(Op::OpenTracker {
                    pipeline_id: workflow.id.clone(),
                });
            }
        }
        KeyCode::Char('r') => {
            let _ = op_tx.send(Op::ListWorkflows);
        }
        _ => return EventStatus::NotConsumed,
    }
    EventStatus::Consumed
}

fn handle_tracker_key(
    key_event: KeyEvent,
    view: &mut ViewState,
    op_tx: &UnboundedSender<Op>,
) -> EventStatus {
    let op = match key_event.code {
        KeyCode::Char('n') => Op::AdvanceOneStep,
        KeyCode::Char('a') => Op::RunAll,
        KeyCode::Char('t') => Op::Retry,
        KeyCode::Esc => Op::CloseTracker,
        KeyCode::Char('f') => {
            view.notice = None;
            view.file_input = Some(String::new());
            return EventStatus::Consumed;
        }
        _ => return EventStatus::NotConsumed,
    };
    view.notice = None;
    let _ = op_tx.send(op);
    EventStatus::Consumed
}

/// Turn a `spec=path` line into a `RecordFiles` operation.
fn submit_file_assignment(raw: &str, view: &mut ViewState, op_tx: &UnboundedSender<Op>) {
    if raw.trim().is_empty() {
        return;
    }
    let parsed = inputs::parse_assignment(raw)
        .and_then(|(spec_id, path)| Ok((spec_id, inputs::expand_path(&path)?)));
    match parsed {
        Ok((spec_id, files)) => {
            view.notice = None;
            let _ = op_tx.send(Op::RecordFiles { spec_id, files });
        }
        Err(err) => view.notice = Some(format!("{err:#}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_protocol::pipeline_models::WorkflowSummary;
    use rf_protocol::session_models::TrackerError;
    use std::path::PathBuf;
    use tokio::sync::mpsc::unbounded_channel;
    use uuid::Uuid;

    fn workflow(id: &str) -> WorkflowSummary {
        serde_json::from_value(serde_json::json!({"id_evaluation": id, "pipeline": id})).unwrap()
    }

    fn press(view: &mut ViewState, op_tx: &UnboundedSender<Op>, code: KeyCode) -> bool {
        handle_keyboard_event(KeyEvent::from(code), view, op_tx)
    }

    fn open_session(view: &mut ViewState) -> Uuid {
        let session_id = Uuid::new_v4();
        handle_core_event(
            view,
            Event::SessionOpened {
                session_id,
                pipeline_id: "7".to_string(),
            },
        );
        session_id
    }

    #[test]
    fn test_workflow_list_navigation_and_open() {
        let mut view = ViewState::default();
        let (op_tx, mut op_rx) = unbounded_channel();
        handle_core_event(
            &mut view,
            Event::WorkflowsListed {
                workflows: vec![workflow("1"), workflow("2")],
            },
        );

        press(&mut view, &op_tx, KeyCode::Down);
        press(&mut view, &op_tx, KeyCode::Down);
        assert_eq!(view.selected_index, 1);
        press(&mut view, &op_tx, KeyCode::Up);
        press(&mut view, &op_tx, KeyCode::Up);
        assert_eq!(view.selected_index, 0);

        press(&mut view, &op_tx, KeyCode::Enter);
        assert_eq!(
            op_rx.try_recv().unwrap(),
            Op::OpenTracker {
                pipeline_id: "1".to_string()
            }
        );

        press(&mut view, &op_tx, KeyCode::Char('r'));
        assert_eq!(op_rx.try_recv().unwrap(), Op::ListWorkflows);
    }

    #[test]
    fn test_tracker_keys_send_ops() {
        let mut view = ViewState::default();
        let (op_tx, mut op_rx) = unbounded_channel();
        open_session(&mut view);

        for (code, expected) in [
            (KeyCode::Char('n'), Op::AdvanceOneStep),
            (KeyCode::Char('a'), Op::RunAll),
            (KeyCode::Char('t'), Op::Retry),
            (KeyCode::Esc, Op::CloseTracker),
        ] {
            assert!(!press(&mut view, &op_tx, code));
            assert_eq!(op_rx.try_recv().unwrap(), expected);
        }
    }

    #[test]
    fn test_quit_from_either_view() {
        let mut view = ViewState::default();
        let (op_tx, _op_rx) = unbounded_channel();
        assert!(press(&mut view, &op_tx, KeyCode::Char('q')));

        open_session(&mut view);
        assert!(press(&mut view, &op_tx, KeyCode::Char('q')));
    }

    #[test]
    fn test_file_input_captures_keys() {
        let mut view = ViewState::default();
        let (op_tx, mut op_rx) = unbounded_channel();
        open_session(&mut view);

        press(&mut view, &op_tx, KeyCode::Char('f'));
        assert_eq!(view.file_input.as_deref(), Some(""));

        // 'q' and 'a' are text while the input line is open.
        assert!(!press(&mut view, &op_tx, KeyCode::Char('q')));
        press(&mut view, &op_tx, KeyCode::Char('a'));
        press(&mut view, &op_tx, KeyCode::Backspace);
        assert_eq!(view.file_input.as_deref(), Some("q"));
        assert!(op_rx.try_recv().is_err());

        press(&mut view, &op_tx, KeyCode::Esc);
        assert_eq!(view.file_input, None);
        assert!(op_rx.try_recv().is_err());
    }

    #[test]
    fn test_file_assignment_submission() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let file = dir.path().join("notas.xlsx");
        std::fs::write(&file, "x").unwrap();

        let mut view = ViewState::default();
        let (op_tx, mut op_rx) = unbounded_channel();
        open_session(&mut view);

        view.file_input = Some(String::new());
        handle_paste(&format!("notas={}\n", file.display()), &mut view);
        press(&mut view, &op_tx, KeyCode::Enter);
        assert_eq!(
            op_rx.try_recv().unwrap(),
            Op::RecordFiles {
                spec_id: "notas".to_string(),
                files: vec![PathBuf::from(&file)],
            }
        );

        view.file_input = Some("no-equals-sign".to_string());
        press(&mut view, &op_tx, KeyCode::Enter);
        assert!(view.notice.is_some());
        assert!(op_rx.try_recv().is_err());
    }

    #[test]
    fn test_session_events_filter_by_session() {
        let mut view = ViewState::default();
        let session_id = open_session(&mut view);

        handle_core_event(
            &mut view,
            Event::FilesRejected {
                session_id: Uuid::new_v4(),
                error: TrackerError::MissingFiles {
                    labels: vec!["A".to_string()],
                },
            },
        );
        assert_eq!(view.notice, None);

        handle_core_event(
            &mut view,
            Event::FilesRejected {
                session_id,
                error: TrackerError::MissingFiles {
                    labels: vec!["A".to_string()],
                },
            },
        );
        assert!(view.notice.as_deref().unwrap().contains('A'));

        handle_core_event(
            &mut view,
            Event::SessionClosed {
                session_id,
                pipeline_id: "7".to_string(),
            },
        );
        assert_eq!(view.session_id, None);
        assert_eq!(view.notice, None);
    }
}
