// src/ui/layout.rs

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Areas of the application's user interface.
pub struct AppLayout {
    pub input: Rect,
    pub results: Rect,
    pub detail: Rect,
    pub summary: Rect,
    pub log_panel: Rect,
    pub footer: Rect,
}

/// Creates the complete application layout.
///
/// The frame is split vertically into the input box, the content area and a
/// one-line footer. The content area holds the results list, the detail view
/// of the selected domain, and a right-hand column with the batch summary on
/// top of the progress log.
///
/// # Arguments
/// * `frame_size` - The `Rect` representing the total size of the terminal frame.
///
/// # Returns
/// An `AppLayout` struct containing the calculated `Rect` for each widget area.
pub fn create_layout(frame_size: Rect) -> AppLayout {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame_size);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(42),
            Constraint::Percentage(28),
        ])
        .split(main_chunks[1]);

    let side_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(16), Constraint::Min(0)])
        .split(content_chunks[2]);

    AppLayout {
        input: main_chunks[0],
        results: content_chunks[0],
        detail: content_chunks[1],
        summary: side_chunks[0],
        log_panel: side_chunks[1],
        footer: main_chunks[2],
    }
}
