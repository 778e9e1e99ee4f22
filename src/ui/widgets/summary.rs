// src/ui/widgets/summary.rs

use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
};
use vanguard_httpcheck::core::models::OutcomeKind;

/// Renders the batch summary: success rate gauge, outcome counts and timing.
///
/// # Arguments
/// * `frame` - The `Frame` used for rendering the UI.
/// * `app` - A reference to the application's state.
/// * `area` - The `Rect` defining the drawable area for this widget.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Success rate
            Constraint::Length(1), // Gauge
            Constraint::Length(1), // Spacer
            Constraint::Min(0),    // Counts and timing
        ])
        .split(area);

    if let Some(message) = &app.error_message {
        let error = Paragraph::new(vec![
            Line::from("SCAN ABORTED".bold().red()),
            Line::from(message.as_str()),
        ]);
        frame.render_widget(error, summary_chunks[3]);
    }

    // Do not render summary content until the scan is complete.
    if !matches!(app.state, AppState::Finished) {
        return;
    }
    let Some(summary) = app.outcome.as_ref().map(|o| &o.summary) else {
        return;
    };

    let rate = summary.success_rate_percent();
    let rate_style = match rate {
        r if r >= 90.0 => Style::default().fg(Color::Green),
        r if r >= 50.0 => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::Red),
    };
    let rate_text = Text::from(vec![
        Line::from("Success Rate".bold()),
        Line::from(format!("{rate:.1}% ({}/{})", summary.success_count, summary.total)).style(rate_style),
    ]);
    frame.render_widget(Paragraph::new(rate_text).alignment(Alignment::Center), summary_chunks[0]);

    let gauge = Gauge::default()
        .percent(rate.round().clamp(0.0, 100.0) as u16)
        .label("")
        .style(rate_style);
    frame.render_widget(gauge, summary_chunks[1]);

    let count = |label: &'static str, value: usize, color: Color| {
        Line::from(vec![
            Span::raw(label),
            Span::styled(value.to_string(), Style::default().fg(color)),
        ])
    };
    let mut lines = vec![
        count("HTTPS:        ", summary.https_success, Color::Green),
        count("HTTP fallback:", summary.http_fallback, Color::Yellow),
        count("Redirected:   ", summary.redirect_count, Color::Cyan),
        count("With TLS:     ", summary.tls_count, Color::Cyan),
        count("No HSTS:      ", summary.missing_hsts, Color::Yellow),
    ];
    for kind in [
        OutcomeKind::DnsError,
        OutcomeKind::ConnectionError,
        OutcomeKind::TlsError,
        OutcomeKind::Timeout,
        OutcomeKind::HttpError,
    ] {
        let n = summary.count_of(kind);
        if n > 0 {
            lines.push(Line::from(vec![
                Span::raw(format!("{kind}: ")),
                Span::styled(n.to_string(), Style::default().fg(Color::Red)),
            ]));
        }
    }
    lines.push(Line::from(""));
    match &summary.timing {
        Some(t) => lines.push(Line::from(format!(
            "avg {:.0}ms  min {:.0}ms  max {:.0}ms",
            t.mean_ms, t.min_ms, t.max_ms
        ))),
        None => lines.push(Line::from("No timing data.")),
    }
    frame.render_widget(Paragraph::new(lines), summary_chunks[3]);
}
