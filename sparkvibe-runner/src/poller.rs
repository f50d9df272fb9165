//! Watch-list polling: fetch every ticker serially and build its snapshot.
//!
//! A failing ticker never aborts the poll. Its warning is recorded and its
//! slot stays empty. The poll stops early only when the provider reports
//! itself unavailable (circuit breaker open) or the caller cancels.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use sparkvibe_core::analysis::{build_snapshot, AnalysisSettings};
use sparkvibe_core::data::{
    CircuitBreaker, DataError, MarketDataProvider, MockProvider, PollProgress, YahooProvider,
};
use sparkvibe_core::domain::{Bar, Fundamentals, TickerSnapshot, WatchEntry};
use sparkvibe_core::earnings::EarningsEvidence;
use sparkvibe_core::watchlist::Watchlist;

use crate::config::{DashboardConfig, DataMode, MAX_HISTORY_DAYS};

/// Settings for one poll, derived from the dashboard config.
#[derive(Debug, Clone)]
pub struct PollOptions {
    pub history_days: i64,
    pub request_delay: Duration,
    pub analysis: AnalysisSettings,
}

impl PollOptions {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            history_days: config.history_days,
            request_delay: config.request_delay(),
            analysis: config.analysis(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollWarning {
    pub symbol: String,
    pub message: String,
    pub severity: Severity,
}

impl PollWarning {
    fn from_error(symbol: &str, err: &DataError) -> Self {
        Self {
            symbol: symbol.to_string(),
            message: err.user_warning(symbol),
            severity: if err.is_warning() {
                Severity::Warning
            } else {
                Severity::Error
            },
        }
    }
}

/// Everything fetched for one ticker; the charts need the bars and evidence
/// as well as the snapshot.
#[derive(Debug, Clone)]
pub struct PolledTicker {
    pub snapshot: TickerSnapshot,
    pub bars: Vec<Bar>,
    pub evidence: EarningsEvidence,
}

/// One watch-list slot: the entry and, if the fetch worked, its data.
#[derive(Debug, Clone)]
pub struct TickerSlot {
    pub entry: WatchEntry,
    pub data: Option<PolledTicker>,
}

#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// Slots in display order (locked symbols first).
    pub slots: Vec<TickerSlot>,
    pub warnings: Vec<PollWarning>,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    /// True when the provider became unavailable or the poll was cancelled.
    pub stopped_early: bool,
}

impl PollOutcome {
    /// Snapshots of successful tickers, in display order.
    pub fn snapshots(&self) -> Vec<&TickerSnapshot> {
        self.tickers().map(|t| &t.snapshot).collect()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &PolledTicker> {
        self.slots.iter().filter_map(|s| s.data.as_ref())
    }

    pub fn get(&self, symbol: &str) -> Option<&PolledTicker> {
        self.slots
            .iter()
            .find(|s| s.entry.symbol == symbol)
            .and_then(|s| s.data.as_ref())
    }

    pub fn entry(&self, symbol: &str) -> Option<&WatchEntry> {
        self.slots.iter().find(|s| s.entry.symbol == symbol).map(|s| &s.entry)
    }

    pub fn succeeded(&self) -> usize {
        self.slots.iter().filter(|s| s.data.is_some()).count()
    }

    pub fn failed(&self) -> usize {
        self.slots.len() - self.succeeded()
    }
}

/// Build the provider the config asks for.
pub fn build_provider(
    config: &DashboardConfig,
    now: NaiveDateTime,
) -> Result<Box<dyn MarketDataProvider>, DataError> {
    match config.mode {
        DataMode::Live => {
            let breaker = Arc::new(CircuitBreaker::default_provider());
            let provider = YahooProvider::new(breaker)?.with_retries(config.max_retries);
            Ok(Box::new(provider))
        }
        DataMode::Mock => {
            let seed = config.mock_seed.unwrap_or_else(rand::random);
            tracing::info!(seed, "using mock market data");
            Ok(Box::new(MockProvider::new(seed, now)))
        }
    }
}

/// Poll every watch-list ticker, serially, with a delay between requests.
pub fn poll_watchlist(
    provider: &dyn MarketDataProvider,
    watchlist: &Watchlist,
    options: &PollOptions,
    now: NaiveDateTime,
    progress: &dyn PollProgress,
    cancel: Option<&AtomicBool>,
) -> PollOutcome {
    let started = Instant::now();
    let entries = watchlist.display_order();
    let total = entries.len();
    let end = now.date();
    let start = history_start(end, options.history_days);

    let mut slots = Vec::with_capacity(total);
    let mut warnings = Vec::new();
    let mut stopped_early = false;

    for (i, entry) in entries.into_iter().enumerate() {
        if stopped_early {
            slots.push(TickerSlot {
                entry: entry.clone(),
                data: None,
            });
            continue;
        }
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            tracing::info!(remaining = total - i, "poll cancelled");
            stopped_early = true;
        } else if !provider.is_available() {
            tracing::warn!(remaining = total - i, "provider unavailable, stopping poll");
            warnings.push(PollWarning {
                symbol: entry.symbol.clone(),
                message: format!(
                    "{} is unavailable (too many failed requests); skipping the remaining {} tickers.",
                    provider.name(),
                    total - i
                ),
                severity: Severity::Error,
            });
            stopped_early = true;
        }
        if stopped_early {
            slots.push(TickerSlot {
                entry: entry.clone(),
                data: None,
            });
            continue;
        }

        if i > 0 && !options.request_delay.is_zero() {
            std::thread::sleep(options.request_delay);
        }

        progress.on_start(&entry.symbol, &entry.name, i, total);
        let (status, data) = match fetch_ticker(provider, entry, start, end, options, now) {
            Ok((ticker, degraded)) => {
                for warning in degraded {
                    progress.on_warning(&entry.symbol, &warning.message);
                    warnings.push(warning);
                }
                (Ok(()), Some(ticker))
            }
            Err(e) => {
                warnings.push(PollWarning::from_error(&entry.symbol, &e));
                (Err(e), None)
            }
        };
        progress.on_complete(&entry.symbol, i, total, &status);

        slots.push(TickerSlot {
            entry: entry.clone(),
            data,
        });
    }

    let succeeded = slots.iter().filter(|s| s.data.is_some()).count();
    progress.on_batch_complete(succeeded, total - succeeded, total);
    tracing::info!(succeeded, failed = total - succeeded, "poll finished");

    let elapsed = chrono::Duration::from_std(started.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());
    PollOutcome {
        slots,
        warnings,
        started_at: now,
        finished_at: now + elapsed,
        stopped_early,
    }
}

/// First day of the history window, clamped to `1..=MAX_HISTORY_DAYS` days.
fn history_start(end: NaiveDate, history_days: i64) -> NaiveDate {
    let days = history_days.clamp(1, MAX_HISTORY_DAYS);
    if days != history_days {
        tracing::warn!(history_days, used = days, "history_days out of range, clamped");
    }
    end.checked_sub_days(chrono::Days::new(days.unsigned_abs()))
        .unwrap_or(NaiveDate::MIN)
}

/// Fetch and analyse one ticker.
///
/// History is required; missing fundamentals only degrade the snapshot and
/// come back as warnings. Earnings evidence is best-effort.
fn fetch_ticker(
    provider: &dyn MarketDataProvider,
    entry: &WatchEntry,
    start: NaiveDate,
    end: NaiveDate,
    options: &PollOptions,
    now: NaiveDateTime,
) -> Result<(PolledTicker, Vec<PollWarning>), DataError> {
    let symbol = entry.symbol.as_str();
    let bars = provider.history(symbol, start, end)?;

    let mut degraded = Vec::new();
    let fundamentals = provider.fundamentals(symbol).unwrap_or_else(|e| {
        degraded.push(PollWarning::from_error(symbol, &e));
        Fundamentals::default()
    });

    let evidence = if entry.kind.has_earnings() {
        provider.earnings_evidence(symbol).unwrap_or_else(|e| {
            tracing::debug!(symbol, error = %e, "no earnings evidence");
            EarningsEvidence::default()
        })
    } else {
        EarningsEvidence::default()
    };

    let snapshot = build_snapshot(entry, &bars, fundamentals, &evidence, now, &options.analysis)
        .map_err(|_| DataError::NoData {
            symbol: symbol.to_string(),
        })?;

    Ok((
        PolledTicker {
            snapshot,
            bars,
            evidence,
        },
        degraded,
    ))
}
