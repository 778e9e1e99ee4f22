// src/ui/widgets/analysis_view.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use strum::IntoEnumIterator;
use vanguard_httpcheck::core::knowledge_base::{self, FindingCategory};
use vanguard_httpcheck::core::models::{DomainResult, SecurityHeader, Severity};

/// Renders the detail view of the selected domain: timings, redirects, TLS,
/// headers and the knowledge-base findings for it.
pub fn render_analysis_view(frame: &mut Frame, app: &App, area: Rect) {
    let main_block = Block::default().borders(Borders::ALL).title("Details");

    let result = match (&app.state, app.selected_result()) {
        (AppState::Finished, Some(result)) => result,
        (AppState::Scanning, _) => {
            let spinner_char = SPINNER_CHARS[app.spinner_frame];
            let content = Paragraph::new(Line::from(vec![
                Span::styled(format!("{spinner_char} "), Style::default().fg(Color::Cyan)),
                Span::raw("Probing domains..."),
            ]))
            .alignment(Alignment::Center);
            frame.render_widget(content.block(main_block), area);
            return;
        }
        _ => {
            let content = Paragraph::new("Select a domain to see its details.").alignment(Alignment::Center);
            frame.render_widget(content.block(main_block), area);
            return;
        }
    };

    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Min(0)])
        .split(inner_area);

    let overview = Paragraph::new(overview_lines(result)).wrap(Wrap { trim: false });
    frame.render_widget(overview, chunks[0]);

    let findings_block = Block::default().borders(Borders::TOP).title("Findings");
    let findings = Paragraph::new(finding_lines(app))
        .wrap(Wrap { trim: true })
        .block(findings_block);
    frame.render_widget(findings, chunks[1]);
}

fn label(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().fg(Color::DarkGray))
}

fn ms(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}ms")).unwrap_or_else(|| "-".to_string())
}

fn overview_lines(result: &DomainResult) -> Vec<Line<'_>> {
    let mut lines = vec![Line::from(result.domain.as_str().bold())];

    match result.status_code() {
        Some(code) => lines.push(Line::from(vec![
            label("Status:   "),
            Span::raw(format!("{code} over {}", result.scheme)),
        ])),
        None => lines.push(Line::from(vec![
            label("Error:    "),
            Span::styled(result.error().unwrap_or_default(), Style::default().fg(Color::Red)),
        ])),
    }
    if let Some(url) = result.final_url() {
        lines.push(Line::from(vec![label("Final:    "), Span::raw(url)]));
    }
    lines.push(Line::from(vec![
        label("Timing:   "),
        Span::raw(format!(
            "dns {}  connect {}  total {}",
            ms(result.timings.dns_ms),
            ms(result.timings.connect_ms),
            ms(result.timings.total_ms)
        )),
    ]));
    let attempts: Vec<String> = result
        .attempts
        .iter()
        .map(|a| format!("{}:{}", a.scheme, a.kind))
        .collect();
    lines.push(Line::from(vec![
        label("Attempts: "),
        Span::raw(format!("{} ({})", result.attempt_count, attempts.join(", "))),
    ]));
    if let Some(server) = result.server() {
        lines.push(Line::from(vec![label("Server:   "), Span::raw(server)]));
    }

    for (i, hop) in result.redirects.iter().enumerate() {
        lines.push(Line::from(vec![
            label(if i == 0 { "Redirect: " } else { "          " }),
            Span::raw(format!("{} → {}", hop.status_code, hop.url)),
        ]));
    }

    if let Some(tls) = &result.tls {
        lines.push(Line::from(vec![
            label("TLS:      "),
            Span::raw(format!("{} {}", tls.protocol, tls.cipher_suite)),
        ]));
        if let Some(cert) = &tls.certificate {
            let style = if cert.is_valid {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            };
            lines.push(Line::from(vec![label("Issuer:   "), Span::raw(cert.issuer_name.as_str())]));
            lines.push(Line::from(vec![
                label("Expires:  "),
                Span::styled(
                    format!("{} ({} days)", cert.not_after.format("%Y-%m-%d"), cert.days_until_expiry),
                    style,
                ),
            ]));
        }
    }

    if result.is_success() {
        let headers: Vec<Span> = SecurityHeader::iter()
            .map(|h| {
                let style = if result.has_header(h) {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Span::styled(format!("{h} "), style)
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(headers));
    }
    lines
}

fn finding_lines(app: &App) -> Vec<Line<'static>> {
    if app.findings.is_empty() {
        return vec![Line::from("✓ No issues found for this domain.".bold().fg(Color::Green))];
    }

    let mut lines = Vec::new();
    for finding in &app.findings {
        let Some(detail) = knowledge_base::get_finding_detail(&finding.code) else {
            lines.push(Line::from(finding.code.clone()));
            continue;
        };
        let prefix = match detail.category {
            FindingCategory::Transport => "[NET] ",
            FindingCategory::Tls => "[TLS] ",
            FindingCategory::Headers => "[HDR] ",
        };
        let title_style = match detail.severity {
            Severity::Critical => Style::default().fg(Color::Red),
            Severity::Warning => Style::default().fg(Color::Yellow),
            Severity::Info => Style::default().fg(Color::Cyan),
        };
        lines.push(Line::from(vec![
            Span::styled(prefix, Style::default().fg(Color::DarkGray)),
            Span::styled(detail.title, title_style.add_modifier(Modifier::BOLD)),
        ]));
        lines.push(Line::from(detail.remediation));
    }
    lines
}
