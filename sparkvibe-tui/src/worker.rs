//! Background worker threads for polling and CPI loading.
//!
//! Communication with the TUI main thread is via `mpsc` channels. A
//! dispatcher thread routes commands to two lanes, one for polls and one for
//! CPI loads, so the Inflation tab never waits behind a watch-list poll. The
//! live provider is built once and kept across polls so its circuit breaker
//! survives refreshes; mock providers are rebuilt per poll.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use sparkvibe_core::data::{DataError, MarketDataProvider, PollProgress};
use sparkvibe_runner::{
    build_provider, load_cpi, poll_watchlist, CpiLoad, DashboardConfig, DataMode, PollOptions,
    PollOutcome,
};

use crate::app::ErrorCategory;

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    Poll { config: Box<DashboardConfig> },
    LoadCpi { config: Box<DashboardConfig> },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug)]
pub enum WorkerResponse {
    FetchProgress {
        symbol: String,
        company: String,
        index: usize,
        total: usize,
    },
    /// A degraded or skipped ticker.
    TickerWarning { symbol: String, message: String },
    PollDone { outcome: Box<PollOutcome> },
    CpiDone { load: Box<CpiLoad> },
    /// The poll could not start at all.
    Error {
        category: ErrorCategory,
        message: String,
        context: String,
    },
}

/// Spawn the background worker. The returned handle joins once every lane
/// has finished after `Shutdown`.
pub fn spawn_worker(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    let poll_tx = tx.clone();
    let mut live: Option<Box<dyn MarketDataProvider>> = None;
    let (poll_lane, poll_handle) = spawn_lane("sparkvibe-poll", move |config| {
        cancel.store(false, Ordering::Relaxed);
        handle_poll(config, &mut live, &poll_tx, &cancel);
    })?;

    let (cpi_lane, cpi_handle) = spawn_lane("sparkvibe-cpi", move |config| {
        let today = chrono::Local::now().date_naive();
        let load = load_cpi(config, today);
        let _ = tx.send(WorkerResponse::CpiDone {
            load: Box::new(load),
        });
    })?;

    thread::Builder::new()
        .name("sparkvibe-worker".into())
        .spawn(move || {
            dispatch(rx, poll_lane, cpi_lane);
            for handle in [poll_handle, cpi_handle] {
                if handle.join().is_err() {
                    tracing::error!("worker lane panicked");
                }
            }
            tracing::debug!("worker stopped");
        })
}

type Lane = Sender<Box<DashboardConfig>>;

/// A thread running `job` for each config it receives, in order, until its
/// sender is dropped.
fn spawn_lane<F>(name: &str, mut job: F) -> std::io::Result<(Lane, JoinHandle<()>)>
where
    F: FnMut(&DashboardConfig) + Send + 'static,
{
    let (lane, rx) = mpsc::channel::<Box<DashboardConfig>>();
    let handle = thread::Builder::new().name(name.into()).spawn(move || {
        while let Ok(config) = rx.recv() {
            job(&config);
        }
    })?;
    Ok((lane, handle))
}

/// Route commands until `Shutdown`; dropping the lanes stops their threads.
fn dispatch(rx: Receiver<WorkerCommand>, poll_lane: Lane, cpi_lane: Lane) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(WorkerCommand::Poll { config }) => {
                if poll_lane.send(config).is_err() {
                    tracing::error!("poll lane is gone");
                }
            }
            Ok(WorkerCommand::LoadCpi { config }) => {
                if cpi_lane.send(config).is_err() {
                    tracing::error!("CPI lane is gone");
                }
            }
        }
    }
}

fn handle_poll(
    config: &DashboardConfig,
    live: &mut Option<Box<dyn MarketDataProvider>>,
    tx: &Sender<WorkerResponse>,
    cancel: &AtomicBool,
) {
    let now = chrono::Utc::now().naive_utc();

    let watchlist = match config.load_watchlist() {
        Ok(w) => w,
        Err(e) => {
            let _ = tx.send(WorkerResponse::Error {
                category: ErrorCategory::Config,
                message: format!("Failed to load watch-list: {e}"),
                context: config
                    .watchlist
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            });
            return;
        }
    };

    let mut mock = None;
    let provider: &dyn MarketDataProvider = match config.mode {
        DataMode::Live => {
            if live.is_none() {
                match build_provider(config, now) {
                    Ok(p) => *live = Some(p),
                    Err(e) => {
                        send_provider_error(tx, &e);
                        return;
                    }
                }
            }
            match live.as_deref() {
                Some(p) => p,
                None => return,
            }
        }
        DataMode::Mock => match build_provider(config, now) {
            Ok(p) => &**mock.insert(p),
            Err(e) => {
                send_provider_error(tx, &e);
                return;
            }
        },
    };

    let progress = ChannelProgress { tx: tx.clone() };
    let outcome = poll_watchlist(
        provider,
        &watchlist,
        &PollOptions::from_config(config),
        now,
        &progress,
        Some(cancel),
    );
    let _ = tx.send(WorkerResponse::PollDone {
        outcome: Box::new(outcome),
    });
}

fn send_provider_error(tx: &Sender<WorkerResponse>, err: &DataError) {
    tracing::error!(error = %err, "failed to build market data provider");
    let _ = tx.send(WorkerResponse::Error {
        category: ErrorCategory::Network,
        message: format!("Market data provider unavailable: {err}"),
        context: String::new(),
    });
}

struct ChannelProgress {
    tx: Sender<WorkerResponse>,
}

impl PollProgress for ChannelProgress {
    fn on_start(&self, symbol: &str, company: &str, index: usize, total: usize) {
        let _ = self.tx.send(WorkerResponse::FetchProgress {
            symbol: symbol.to_string(),
            company: company.to_string(),
            index,
            total,
        });
    }

    fn on_complete(&self, symbol: &str, _index: usize, _total: usize, result: &Result<(), DataError>) {
        if let Err(e) = result {
            let _ = self.tx.send(WorkerResponse::TickerWarning {
                symbol: symbol.to_string(),
                message: e.user_warning(symbol),
            });
        }
    }

    fn on_warning(&self, symbol: &str, message: &str) {
        let _ = self.tx.send(WorkerResponse::TickerWarning {
            symbol: symbol.to_string(),
            message: message.to_string(),
        });
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn mock_config(dir: &std::path::Path) -> DashboardConfig {
        let watchlist = dir.join("tickers.toml");
        std::fs::write(
            &watchlist,
            "[[ticker]]\nsymbol = \"AAPL\"\nname = \"Apple Inc.\"\n\n\
             [[ticker]]\nsymbol = \"SPY\"\nname = \"SPDR S&P 500 ETF\"\nkind = \"etf\"\n",
        )
        .unwrap();
        DashboardConfig {
            mode: DataMode::Mock,
            mock_seed: Some(9),
            request_delay_ms: Some(0),
            watchlist: Some(watchlist),
            ..DashboardConfig::default()
        }
    }

    #[test]
    fn worker_shutdown() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, _resp_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let handle = spawn_worker(cmd_rx, resp_tx, cancel).unwrap();
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().expect("worker should join cleanly");
    }

    #[test]
    fn mock_poll_reports_progress_then_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let config = mock_config(dir.path());
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_worker(cmd_rx, resp_tx, Arc::new(AtomicBool::new(false))).unwrap();

        cmd_tx
            .send(WorkerCommand::Poll {
                config: Box::new(config),
            })
            .unwrap();

        let mut progress = Vec::new();
        let outcome = loop {
            match resp_rx.recv_timeout(Duration::from_secs(30)).unwrap() {
                WorkerResponse::FetchProgress { symbol, total, .. } => {
                    assert_eq!(total, 2);
                    progress.push(symbol);
                }
                WorkerResponse::PollDone { outcome } => break outcome,
                other => panic!("unexpected response: {other:?}"),
            }
        };
        // Locked symbols come first.
        assert_eq!(progress, vec!["SPY", "AAPL"]);
        assert_eq!(outcome.succeeded(), 2);

        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn missing_watchlist_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            mode: DataMode::Mock,
            watchlist: Some(dir.path().join("nope.toml")),
            ..DashboardConfig::default()
        };
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_worker(cmd_rx, resp_tx, Arc::new(AtomicBool::new(false))).unwrap();

        cmd_tx
            .send(WorkerCommand::Poll {
                config: Box::new(config),
            })
            .unwrap();
        match resp_rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            WorkerResponse::Error { category, .. } => assert_eq!(category, ErrorCategory::Config),
            other => panic!("unexpected response: {other:?}"),
        }

        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn cpi_load_in_mock_mode() {
        let dir = tempfile::tempdir().unwrap();
        let config = mock_config(dir.path());
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_worker(cmd_rx, resp_tx, Arc::new(AtomicBool::new(false))).unwrap();

        cmd_tx
            .send(WorkerCommand::LoadCpi {
                config: Box::new(config),
            })
            .unwrap();
        match resp_rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            WorkerResponse::CpiDone { load } => {
                assert!(load.warning.is_none());
                assert!(!load.dataset.is_empty());
            }
            other => panic!("unexpected response: {other:?}"),
        }

        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn cpi_load_does_not_wait_for_poll() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            request_delay_ms: Some(400),
            ..mock_config(dir.path())
        };
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_worker(cmd_rx, resp_tx, Arc::new(AtomicBool::new(false))).unwrap();

        cmd_tx
            .send(WorkerCommand::Poll {
                config: Box::new(config.clone()),
            })
            .unwrap();
        cmd_tx
            .send(WorkerCommand::LoadCpi {
                config: Box::new(config),
            })
            .unwrap();

        let mut order = Vec::new();
        while order.len() < 2 {
            match resp_rx.recv_timeout(Duration::from_secs(30)).unwrap() {
                WorkerResponse::PollDone { .. } => order.push("poll"),
                WorkerResponse::CpiDone { .. } => order.push("cpi"),
                _ => {}
            }
        }
        assert_eq!(order, vec!["cpi", "poll"]);

        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }
}
