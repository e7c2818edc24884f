//! Tracker panel for one pipeline session.
//!
//! Layout, top to bottom: status line, progress gauge, step list, upload
//! slots, outcome (error or artifacts) and the key help / file input line.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;
use rf_protocol::session_models::{SessionStatus, StepState, TrackerSnapshot};

const HELP: &str = "n next step  a run all  t retry  f add files  Esc close  q quit";

/// Text shown inside the progress gauge.
pub fn progress_label(snapshot: &TrackerSnapshot) -> String {
    if snapshot.steps.is_empty() {
        return "No steps".to_string();
    }
    format!(
        "Step {} of {}",
        snapshot.display_index + 1,
        snapshot.steps.len()
    )
}

fn step_marker(state: StepState) -> (&'static str, Style) {
    match state {
        StepState::Completed => ("[x]", Style::default().fg(Color::Green)),
        StepState::Current => (
            "[>]",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        StepState::Errored => ("[!]", Style::default().fg(Color::Red)),
        StepState::Pending => ("[ ]", Style::default().fg(Color::DarkGray)),
    }
}

fn status_style(status: SessionStatus) -> Style {
    match status {
        SessionStatus::Loading | SessionStatus::Executing => Style::default().fg(Color::Yellow),
        SessionStatus::RequestingFiles => Style::default().fg(Color::Magenta),
        SessionStatus::Idle => Style::default().fg(Color::White),
        SessionStatus::Success => Style::default().fg(Color::Green),
        SessionStatus::Error => Style::default().fg(Color::Red),
    }
}

/// Renders the tracker for `snapshot`, or a loading placeholder before the
/// first snapshot arrives.
pub fn render_tracker(
    frame: &mut Frame,
    area: Rect,
    snapshot: Option<&TrackerSnapshot>,
    notice: Option<&str>,
    file_input: Option<&str>,
) {
    let Some(snapshot) = snapshot else {
        let placeholder = Paragraph::new("Opening session...")
            .block(Block::default().borders(Borders::ALL).title("Tracker"));
        frame.render_widget(placeholder, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(slot_height(snapshot)),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);

    render_status(frame, chunks[0], snapshot);
    render_gauge(frame, chunks[1], snapshot);
    render_steps(frame, chunks[2], snapshot);
    if !snapshot.file_specs.is_empty() {
        render_slots(frame, chunks[3], snapshot);
    }
    render_outcome(frame, chunks[4], snapshot, notice);
    render_input(frame, chunks[5], file_input);
}

fn slot_height(snapshot: &TrackerSnapshot) -> u16 {
    if snapshot.file_specs.is_empty() {
        0
    } else {
        u16::try_from(snapshot.file_specs.len())
            .unwrap_or(u16::MAX)
            .saturating_add(2)
    }
}

fn render_status(frame: &mut Frame, area: Rect, snapshot: &TrackerSnapshot) {
    let line = Line::from(vec![
        Span::raw(format!("Pipeline {}  ", snapshot.pipeline_id)),
        Span::styled(snapshot.status.as_str(), status_style(snapshot.status)),
    ]);
    let block = Block::default().borders(Borders::ALL).title("Tracker");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_gauge(frame: &mut Frame, area: Rect, snapshot: &TrackerSnapshot) {
    let percent = snapshot.progress_percent.round().clamp(0.0, 100.0) as u16;
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(status_style(snapshot.status))
        .percent(percent)
        .label(progress_label(snapshot));
    frame.render_widget(gauge, area);
}

fn render_steps(frame: &mut Frame, area: Rect, snapshot: &TrackerSnapshot) {
    let items: Vec<ListItem> = snapshot
        .steps
        .iter()
        .zip(snapshot.step_states.iter().copied())
        .enumerate()
        .map(|(index, (step, state))| {
            let (marker, style) = step_marker(state);
            ListItem::new(Line::from(vec![
                Span::styled(format!("{marker} "), style),
                Span::raw(format!("{}. {}", index + 1, step.name.label())),
            ]))
        })
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Steps"));
    frame.render_widget(list, area);
}

fn render_slots(frame: &mut Frame, area: Rect, snapshot: &TrackerSnapshot) {
    let lines: Vec<Line> = snapshot
        .file_specs
        .iter()
        .map(|spec| {
            let files = snapshot
                .collected_files
                .get(&spec.id)
                .filter(|files| !files.is_empty());
            let summary = match files {
                Some(files) => files
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                None if spec.required => "(required)".to_string(),
                None => "(optional)".to_string(),
            };
            let style = if files.is_none() && spec.required {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(format!("{} [{}]: ", spec.label, spec.id)),
                Span::styled(summary, style),
            ])
        })
        .collect();
    let block = Block::default().borders(Borders::ALL).title("Files");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_outcome(
    frame: &mut Frame,
    area: Rect,
    snapshot: &TrackerSnapshot,
    notice: Option<&str>,
) {
    let (text, style) = if let Some(notice) = notice {
        (notice.to_string(), Style::default().fg(Color::Yellow))
    } else if let Some(error) = &snapshot.error {
        (format!("{error} (t to retry)"), Style::default().fg(Color::Red))
    } else if let Some(result) = &snapshot.result {
        let artifacts = if result.artifacts.is_empty() {
            "none".to_string()
        } else {
            result.artifacts.join(", ")
        };
        (
            format!("Done. Artifacts: {artifacts}"),
            Style::default().fg(Color::Green),
        )
    } else {
        (String::new(), Style::default())
    };

    let paragraph = Paragraph::new(text)
        .style(style)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_input(frame: &mut Frame, area: Rect, file_input: Option<&str>) {
    let paragraph = match file_input {
        Some(input) => Paragraph::new(format!("> {input}"))
            .style(Style::default().fg(Color::Yellow))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("spec=path (Enter submit, Esc cancel)"),
            ),
        None => Paragraph::new(HELP).block(Block::default().borders(Borders::ALL)),
    };
    frame.render_widget(paragraph, area);
}
