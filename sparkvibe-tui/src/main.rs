//! SparkVibe TUI — five-tab terminal market dashboard.
//!
//! Tabs:
//! 1. Summary Table — price, volume, valuation, moving averages, earnings
//! 2. Golden Cross — tickers whose 50-day MA recently crossed above the 200-day
//! 3. Death Cross — the reverse
//! 4. Volume Analysis — volume vs. 30-day average with earnings markers
//! 5. Inflation (CPI) — BLS consumer price index by category

mod app;
mod input;
mod persistence;
mod theme;
mod ui;
mod worker;

use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use sparkvibe_runner::{init_logging, DashboardConfig, LogConfig, LogTarget, Severity};

use crate::app::{AppState, ErrorCategory};
use crate::worker::{WorkerCommand, WorkerResponse};

fn main() -> Result<()> {
    // Restore the terminal before printing a panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let state_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sparkvibe")
        .join("state.json");
    let log_path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sparkvibe")
        .join("sparkvibe.log");
    init_logging(&LogConfig::from_env("info", LogTarget::File(log_path)))?;

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = DashboardConfig::load(config_path.as_deref())
        .context("failed to load dashboard config")?;
    tracing::info!(mode = config.mode.label(), "starting dashboard");

    let persisted = persistence::load(&state_path);

    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let worker_handle = worker::spawn_worker(cmd_rx, resp_tx, cancel.clone())
        .context("failed to spawn worker thread")?;

    let mut app = AppState::new(
        config,
        cmd_tx.clone(),
        resp_rx,
        cancel.clone(),
        state_path,
    );
    persistence::apply(&mut app, persisted);

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    app.request_refresh();
    let result = run_app(&mut terminal, &mut app);

    let persisted = persistence::extract(&app);
    if let Err(e) = persistence::save(&app.state_path, &persisted) {
        tracing::warn!(error = %e, "failed to save UI state");
    }

    cancel.store(true, Ordering::Relaxed);
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        while let Ok(resp) = app.worker_rx.try_recv() {
            handle_worker_response(app, resp);
        }

        if app.refresh_due(Instant::now()) {
            app.request_refresh();
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        if !app.running {
            break;
        }
    }
    Ok(())
}

fn handle_worker_response(app: &mut AppState, resp: WorkerResponse) {
    match resp {
        WorkerResponse::FetchProgress {
            symbol,
            company,
            index,
            total,
        } => {
            app.fetch_progress = Some(app::FetchProgress {
                symbol,
                company,
                index,
                total,
            });
        }
        // History entries come from the outcome; this only updates the status line.
        WorkerResponse::TickerWarning { symbol, message } => {
            app.set_warning(format!("{symbol}: {message}"));
        }
        WorkerResponse::PollDone { outcome } => {
            app.poll_in_flight = false;
            app.fetch_progress = None;
            app.last_update = Some(chrono::Local::now().naive_local());

            for warning in &outcome.warnings {
                let context = match warning.severity {
                    Severity::Warning => "degraded",
                    Severity::Error => "skipped",
                };
                app.push_error(
                    ErrorCategory::Ticker,
                    format!("{}: {}", warning.symbol, warning.message),
                    context.to_string(),
                );
            }

            let (ok, failed) = (outcome.succeeded(), outcome.failed());
            tracing::info!(ok, failed, stopped_early = outcome.stopped_early, "poll finished");
            app.outcome = Some(*outcome);
            app.clamp_cursors();

            if failed > 0 {
                app.set_warning(format!("Updated {ok} tickers ({failed} failed)"));
            } else {
                app.set_status(format!("Updated {ok} tickers"));
            }
        }
        WorkerResponse::CpiDone { load } => {
            app.cpi_in_flight = false;
            if let Some(warning) = &load.warning {
                app.push_error(ErrorCategory::Cpi, warning.clone(), String::new());
            }
            app.cpi = Some(*load);
            app.clamp_cursors();
        }
        WorkerResponse::Error {
            category,
            message,
            context,
        } => {
            tracing::error!(category = category.label(), %message, %context, "worker error");
            app.poll_in_flight = false;
            app.cpi_in_flight = false;
            app.fetch_progress = None;
            app.push_error(category, message, context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use crate::app::StatusLevel;
    use chrono::NaiveDate;
    use sparkvibe_core::cpi::{CpiDataset, CpiSource};
    use sparkvibe_runner::{CpiLoad, PollOutcome, PollWarning};

    fn outcome(warnings: Vec<PollWarning>) -> PollOutcome {
        let at = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        PollOutcome {
            slots: Vec::new(),
            warnings,
            started_at: at,
            finished_at: at,
            stopped_early: false,
        }
    }

    #[test]
    fn poll_done_records_warnings_once() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        app.poll_in_flight = true;

        handle_worker_response(
            &mut app,
            WorkerResponse::TickerWarning {
                symbol: "XYZ".into(),
                message: "symbol not found".into(),
            },
        );
        assert!(app.error_history.is_empty());

        let warning = PollWarning {
            symbol: "XYZ".into(),
            message: "symbol not found".into(),
            severity: Severity::Error,
        };
        handle_worker_response(
            &mut app,
            WorkerResponse::PollDone {
                outcome: Box::new(outcome(vec![warning])),
            },
        );

        assert!(!app.poll_in_flight);
        assert!(app.outcome.is_some());
        assert!(app.last_update.is_some());
        assert_eq!(app.error_history.len(), 1);
        assert_eq!(app.error_history[0].category, ErrorCategory::Ticker);
        assert_eq!(app.error_history[0].context, "skipped");
    }

    #[test]
    fn progress_is_cleared_when_poll_finishes() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        handle_worker_response(
            &mut app,
            WorkerResponse::FetchProgress {
                symbol: "SPY".into(),
                company: "SPDR S&P 500 ETF".into(),
                index: 0,
                total: 3,
            },
        );
        assert!(app.fetch_progress.is_some());

        handle_worker_response(
            &mut app,
            WorkerResponse::PollDone {
                outcome: Box::new(outcome(Vec::new())),
            },
        );
        assert!(app.fetch_progress.is_none());
        let (msg, level) = app.status_message.clone().unwrap();
        assert_eq!(msg, "Updated 0 tickers");
        assert_eq!(level, StatusLevel::Info);
    }

    #[test]
    fn cpi_warning_goes_to_history() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        app.cpi_in_flight = true;
        let load = CpiLoad {
            dataset: CpiDataset::new(Vec::new(), CpiSource::Synthetic),
            warning: Some("BLS API access limited".into()),
        };
        handle_worker_response(&mut app, WorkerResponse::CpiDone { load: Box::new(load) });

        assert!(!app.cpi_in_flight);
        assert!(app.cpi.is_some());
        assert_eq!(app.error_history[0].category, ErrorCategory::Cpi);
    }

    #[test]
    fn worker_error_clears_in_flight_flags() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        app.poll_in_flight = true;
        app.cpi_in_flight = true;
        handle_worker_response(
            &mut app,
            WorkerResponse::Error {
                category: ErrorCategory::Config,
                message: "watch-list missing".into(),
                context: "tickers.csv".into(),
            },
        );
        assert!(!app.poll_in_flight);
        assert!(!app.cpi_in_flight);
        assert_eq!(app.error_history.len(), 1);
    }
}
