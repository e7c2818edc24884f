//! Workflow list panel.
//!
//! A table of the workflows the executor knows about. The selected row is
//! the one `Enter` opens in the tracker.

use ratatui::layout::Constraint;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Cell;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Row;
use ratatui::widgets::Table;
use ratatui::widgets::TableState;
use ratatui::Frame;
use rf_protocol::pipeline_models::WorkflowSummary;

const TITLE: &str = "Workflows (Enter open, r refresh, q quit)";

/// Renders the workflow table, or the listing error when there is one.
pub fn render_workflow_list(
    frame: &mut Frame,
    area: Rect,
    workflows: &[WorkflowSummary],
    selected: usize,
    error: Option<&str>,
) {
    let block = Block::default().borders(Borders::ALL).title(TITLE);

    if let Some(message) = error {
        let paragraph = Paragraph::new(format!("Could not load workflows: {message}"))
            .style(Style::default().fg(Color::Red))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    if workflows.is_empty() {
        frame.render_widget(Paragraph::new("No workflows available.").block(block), area);
        return;
    }

    let rows: Vec<Row> = workflows
        .iter()
        .map(|w| {
            Row::new(vec![
                Cell::from(w.id.clone()),
                Cell::from(w.name.clone()),
                Cell::from(w.input.clone().unwrap_or_default()),
                Cell::from(w.output.clone().unwrap_or_default()),
                Cell::from(w.last_run.clone().unwrap_or_else(|| "-".to_string())),
            ])
        })
        .collect();

    let header = Row::new(vec!["ID", "Pipeline", "Input", "Output", "Last run"]).style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Color::Cyan),
    );

    let widths = [
        Constraint::Length(6),
        Constraint::Percentage(50),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(20),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut table_state = TableState::default();
    table_state.select(Some(selected.min(workflows.len() - 1)));

    frame.render_stateful_widget(table, area, &mut table_state);
}
