// src/app.rs

use chrono::{Local, Utc};
use ratatui::widgets::{ListState, ScrollbarState};
use vanguard_httpcheck::core::config::ScanConfig;
use vanguard_httpcheck::core::error::ConfigError;
use vanguard_httpcheck::core::export::{JsonFileSink, ResultSink};
use vanguard_httpcheck::core::knowledge_base;
use vanguard_httpcheck::core::models::{AnalysisFinding, DomainResult, ProgressEvent};
use vanguard_httpcheck::core::scanner::ScanOutcome;
use vanguard_httpcheck::logging;

pub const SPINNER_CHARS: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Number of progress lines kept for the log panel.
const MAX_LOG_LINES: usize = 500;

pub enum ExportStatus {
    Idle,
    Success(String),
    Error(String),
}

pub enum AppState {
    Idle,
    Scanning,
    Finished,
}

pub struct App {
    pub should_quit: bool,
    pub show_disclaimer: bool,
    pub state: AppState,
    pub input: String,
    pub config: ScanConfig,
    pub outcome: Option<ScanOutcome>,
    /// Finished results in input order, as listed in the results panel.
    pub results: Vec<DomainResult>,
    pub results_list_state: ListState,
    /// Findings for the currently selected result.
    pub findings: Vec<AnalysisFinding>,
    pub completed: usize,
    pub total: usize,
    pub spinner_frame: usize,
    pub error_message: Option<String>,
    pub export_status: ExportStatus,
    pub log_content: Vec<String>,
    pub log_horizontal_scroll: usize,
    pub log_horizontal_scroll_state: ScrollbarState,
}

impl App {
    pub fn new(config: ScanConfig, initial_targets: &[String]) -> Self {
        Self {
            should_quit: false,
            show_disclaimer: true,
            state: AppState::Idle,
            input: initial_targets.join(" "),
            config,
            outcome: None,
            results: Vec::new(),
            results_list_state: ListState::default(),
            findings: Vec::new(),
            completed: 0,
            total: 0,
            spinner_frame: 0,
            error_message: None,
            export_status: ExportStatus::Idle,
            log_content: Vec::new(),
            log_horizontal_scroll: 0,
            log_horizontal_scroll_state: ScrollbarState::default(),
        }
    }

    pub fn on_tick(&mut self) {
        if matches!(self.state, AppState::Scanning) {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
    }

    /// Splits the input box into raw targets and switches to scanning.
    ///
    /// # Returns
    /// The targets to hand to the scanner, or `None` when the input is blank.
    pub fn start_scan(&mut self) -> Option<Vec<String>> {
        let targets = split_targets(&self.input);
        if targets.is_empty() {
            return None;
        }
        self.state = AppState::Scanning;
        self.error_message = None;
        self.completed = 0;
        self.total = 0;
        self.log_content.clear();
        self.push_log(format!("Scan started for {} target(s).", targets.len()));
        Some(targets)
    }

    pub fn on_progress(&mut self, event: ProgressEvent) {
        self.completed = event.completed;
        self.total = event.total;
        let status = match event.status_code {
            Some(code) => format!("{} {code}", event.kind),
            None => event.kind.to_string(),
        };
        let timing = event
            .total_ms
            .map(|ms| format!(" {ms:.0}ms"))
            .unwrap_or_default();
        self.push_log(format!(
            "[{}/{}] {} {} via {}{}",
            event.completed, event.total, event.domain, status, event.scheme, timing
        ));
    }

    pub fn on_finished(&mut self, outcome: Result<ScanOutcome, ConfigError>) {
        match outcome {
            Ok(outcome) => {
                self.results = outcome.in_input_order().into_iter().cloned().collect();
                self.push_log(format!(
                    "Scan finished: {}/{} reachable.",
                    outcome.summary.success_count, outcome.summary.total
                ));
                self.outcome = Some(outcome);
                self.results_list_state = ListState::default();
                if !self.results.is_empty() {
                    self.select(0);
                }
            }
            Err(e) => {
                self.push_log(format!("Scan aborted: {e}"));
                self.error_message = Some(e.to_string());
            }
        }
        self.state = AppState::Finished;
    }

    pub fn selected_result(&self) -> Option<&DomainResult> {
        self.results_list_state
            .selected()
            .and_then(|i| self.results.get(i))
    }

    fn select(&mut self, index: usize) {
        self.results_list_state.select(Some(index));
        self.findings = self
            .results
            .get(index)
            .map(knowledge_base::analyze_result)
            .unwrap_or_default();
    }

    pub fn select_next(&mut self) {
        if self.results.is_empty() {
            return;
        }
        let next = match self.results_list_state.selected() {
            Some(i) if i + 1 < self.results.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.select(next);
    }

    pub fn select_previous(&mut self) {
        if self.results.is_empty() {
            return;
        }
        let previous = self
            .results_list_state
            .selected()
            .map(|i| i.saturating_sub(1))
            .unwrap_or(0);
        self.select(previous);
    }

    pub fn scroll_log_left(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_sub(4);
        self.log_horizontal_scroll_state = self
            .log_horizontal_scroll_state
            .position(self.log_horizontal_scroll);
    }

    pub fn scroll_log_right(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_add(4);
        self.log_horizontal_scroll_state = self
            .log_horizontal_scroll_state
            .position(self.log_horizontal_scroll);
    }

    /// Writes the finished batch as JSON into the data directory.
    pub fn export(&mut self) {
        let Some(outcome) = &self.outcome else {
            self.export_status = ExportStatus::Error("Nothing to export yet.".to_string());
            return;
        };
        let file_name = format!("httpcheck-report-{}.json", Utc::now().format("%Y%m%d-%H%M%S"));
        let sink = JsonFileSink::new(logging::get_data_dir().join(file_name));
        self.export_status = match sink.persist(outcome) {
            Ok(()) => ExportStatus::Success(sink.path().display().to_string()),
            Err(e) => ExportStatus::Error(e.to_string()),
        };
    }

    fn push_log(&mut self, message: String) {
        let line = format!("{} {message}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        self.log_content.push(line);
        if self.log_content.len() > MAX_LOG_LINES {
            let excess = self.log_content.len() - MAX_LOG_LINES;
            self.log_content.drain(..excess);
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn reset(&mut self) {
        let config = self.config.clone();
        *self = Self::new(config, &[]);
        self.show_disclaimer = false;
    }
}

/// Targets typed into the input box, separated by whitespace or commas.
pub fn split_targets(input: &str) -> Vec<String> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
