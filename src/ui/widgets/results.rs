// src/ui/widgets/results.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use vanguard_httpcheck::core::models::{DomainResult, OutcomeKind};

/// Renders the per-domain results list, or the scan status while it is running.
pub fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let results_block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Results ({}) ↑ ↓", app.results.len()));

    match app.state {
        AppState::Idle => {
            let instructions = Paragraph::new(
                "Enter one or more domains and press Enter to start the scan.\nPress 'q' to quit.",
            )
            .block(results_block)
            .wrap(Wrap { trim: true });
            frame.render_widget(instructions, area);
        }
        AppState::Scanning => {
            let spinner_char = SPINNER_CHARS[app.spinner_frame];
            let progress = if app.total == 0 {
                "Scanning... Please wait.".to_string()
            } else {
                format!("Scanning... {}/{} domains done.", app.completed, app.total)
            };
            let scanning_text = Paragraph::new(Line::from(vec![
                Span::styled(format!("{spinner_char} "), Style::default().fg(Color::Cyan)),
                Span::raw(progress),
            ]))
            .block(results_block)
            .alignment(Alignment::Center);
            frame.render_widget(scanning_text, area);
        }
        AppState::Finished => {
            let items: Vec<ListItem> = app.results.iter().map(result_item).collect();
            let list = List::new(items)
                .block(results_block)
                .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
            frame.render_stateful_widget(list, area, &mut app.results_list_state);
        }
    }
}

fn result_item(result: &DomainResult) -> ListItem<'_> {
    let (icon, style) = match (result.outcome_kind(), result.status_code()) {
        (OutcomeKind::Success, Some(code)) if code >= 500 => ("!", Style::default().fg(Color::Red)),
        (OutcomeKind::Success, Some(code)) if code >= 400 => ("!", Style::default().fg(Color::Yellow)),
        (OutcomeKind::Success, _) => ("✓", Style::default().fg(Color::Green)),
        _ => ("✗", Style::default().fg(Color::Red)),
    };
    let status = match result.status_code() {
        Some(code) => format!("{code} {}", result.scheme),
        None => result.outcome_kind().to_string(),
    };

    ListItem::new(Line::from(vec![
        Span::styled(format!("{icon} "), style),
        Span::raw(result.domain.as_str()),
        Span::styled(format!("  {status}"), Style::default().fg(Color::DarkGray)),
    ]))
}
