// src/main.rs

use clap::Parser;
use color_eyre::eyre::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::{Stdout, stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use vanguard_httpcheck::cli::Cli;
use vanguard_httpcheck::core::config::ScanConfig;
use vanguard_httpcheck::core::error::ConfigError;
use vanguard_httpcheck::core::export::write_json_report;
use vanguard_httpcheck::core::models::ProgressEvent;
use vanguard_httpcheck::core::scanner::{ScanOutcome, Scanner};
use vanguard_httpcheck::logging;

mod app;
mod ui;

use app::{App, AppState};

type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
type DoneSender = mpsc::Sender<Result<ScanOutcome, ConfigError>>;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    let cli = Cli::parse();
    let config = cli.to_config()?;
    let targets = cli.targets()?;
    info!(targets = targets.len(), headless = cli.headless, "Starting vanguard-httpcheck.");

    if cli.headless {
        run_headless(config, targets, cli.output.as_deref()).await
    } else {
        run_tui(config, targets, cli.output).await
    }
}

// --- Headless Mode ---

async fn run_headless(config: ScanConfig, targets: Vec<String>, output: Option<&Path>) -> Result<()> {
    let scanner = Scanner::new(config)?;
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let status = event
                .status_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| event.kind.to_string());
            println!("[{}/{}] {:<40} {:<18} {}", event.completed, event.total, event.domain, status, event.scheme);
        }
    });

    let outcome = scanner.scan(targets, Some(tx)).await?;
    printer.await?;
    print_summary(&outcome);

    if let Some(path) = output {
        write_json_report(path, &outcome)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn print_summary(outcome: &ScanOutcome) {
    let summary = &outcome.summary;
    println!();
    println!("Domains:        {}", summary.total);
    println!(
        "Reachable:      {} ({:.1}%)",
        summary.success_count,
        summary.success_rate_percent()
    );
    println!("Errors:         {}", summary.error_count);
    println!("HTTPS:          {}", summary.https_success);
    println!("HTTP fallback:  {}", summary.http_fallback);
    println!("Redirected:     {} ({} hops)", summary.redirect_count, summary.redirect_hops);
    if let Some(timing) = &summary.timing {
        println!(
            "Response time:  avg {:.0}ms, min {:.0}ms, max {:.0}ms",
            timing.mean_ms, timing.min_ms, timing.max_ms
        );
    }
    for (kind, count) in summary.counts_by_kind.iter().filter(|(k, _)| !k.is_success()) {
        println!("  {kind}: {count}");
    }
}

// --- Terminal UI ---

async fn run_tui(config: ScanConfig, targets: Vec<String>, output: Option<PathBuf>) -> Result<()> {
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut app = App::new(config, &targets);
    let result = event_loop(&mut terminal, &mut app, output.as_deref()).await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    output: Option<&Path>,
) -> Result<()> {
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let (done_tx, mut done_rx) = mpsc::channel(1);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(app, &progress_tx, &done_tx)?;
        }
        app.on_tick();

        while let Ok(event) = progress_rx.try_recv() {
            app.on_progress(event);
        }
        if let Ok(outcome) = done_rx.try_recv() {
            if let (Ok(outcome), Some(path)) = (&outcome, output) {
                if let Err(e) = write_json_report(path, outcome) {
                    error!(error = %e, path = %path.display(), "Failed to write JSON report.");
                }
            }
            app.on_finished(outcome);
        }
    }
    Ok(())
}

fn handle_events(app: &mut App, progress_tx: &ProgressSender, done_tx: &DoneSender) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if app.show_disclaimer {
            match key.code {
                KeyCode::Enter => app.show_disclaimer = false,
                KeyCode::Esc => app.quit(),
                _ => {}
            }
            return Ok(());
        }
        match app.state {
            AppState::Idle => handle_idle_input(app, key.code, progress_tx, done_tx),
            AppState::Finished => handle_finished_input(app, key.code),
            AppState::Scanning => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                KeyCode::Left => app.scroll_log_left(),
                KeyCode::Right => app.scroll_log_right(),
                _ => {}
            },
        }
    }
    Ok(())
}

fn handle_idle_input(app: &mut App, key_code: KeyCode, progress_tx: &ProgressSender, done_tx: &DoneSender) {
    match key_code {
        KeyCode::Esc => app.quit(),
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Enter => {
            if let Some(targets) = app.start_scan() {
                spawn_scan(app.config.clone(), targets, progress_tx.clone(), done_tx.clone());
            }
        }
        _ => {}
    }
}

fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('n') | KeyCode::Char('N') => app.reset(),
        KeyCode::Char('e') | KeyCode::Char('E') => app.export(),
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        KeyCode::Left => app.scroll_log_left(),
        KeyCode::Right => app.scroll_log_right(),
        _ => {}
    }
}

fn spawn_scan(config: ScanConfig, targets: Vec<String>, progress_tx: ProgressSender, done_tx: DoneSender) {
    tokio::spawn(async move {
        let outcome = match Scanner::new(config) {
            Ok(scanner) => scanner.scan(targets, Some(progress_tx)).await,
            Err(e) => Err(e),
        };
        let _ = done_tx.send(outcome).await;
    });
}
