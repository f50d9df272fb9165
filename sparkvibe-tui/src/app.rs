//! Application state, owned by the main thread.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use sparkvibe_core::cpi::{CpiObservation, DEFAULT_CHART_CATEGORIES};
use sparkvibe_core::domain::TickerSnapshot;
use sparkvibe_core::indicators::CrossKind;
use sparkvibe_runner::views::{cross_rows, volume_rows, CrossRow, VolumeRow};
use sparkvibe_runner::{
    CpiLoad, CrossColumn, DashboardConfig, PollOutcome, SummaryColumn, TableColumn, TableSort,
    VolumeColumn,
};

use crate::worker::WorkerCommand;

const ERROR_HISTORY_CAP: usize = 50;

/// Which tab is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tab {
    Summary,
    GoldenCross,
    DeathCross,
    Volume,
    Inflation,
}

impl Tab {
    pub const COUNT: usize = 5;

    pub fn index(self) -> usize {
        match self {
            Tab::Summary => 0,
            Tab::GoldenCross => 1,
            Tab::DeathCross => 2,
            Tab::Volume => 3,
            Tab::Inflation => 4,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Tab::Summary),
            1 => Some(Tab::GoldenCross),
            2 => Some(Tab::DeathCross),
            3 => Some(Tab::Volume),
            4 => Some(Tab::Inflation),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Summary => "Summary Table",
            Tab::GoldenCross => "Golden Cross",
            Tab::DeathCross => "Death Cross",
            Tab::Volume => "Volume Analysis",
            Tab::Inflation => "Inflation (CPI)",
        }
    }

    pub fn next(self) -> Tab {
        Tab::from_index((self.index() + 1) % Self::COUNT).unwrap_or(Tab::Summary)
    }

    pub fn prev(self) -> Tab {
        Tab::from_index((self.index() + Self::COUNT - 1) % Self::COUNT).unwrap_or(Tab::Summary)
    }

    /// The cross kind a cross tab lists.
    pub fn cross_kind(self) -> Option<CrossKind> {
        match self {
            Tab::GoldenCross => Some(CrossKind::Golden),
            Tab::DeathCross => Some(CrossKind::Death),
            _ => None,
        }
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A ticker the poll skipped or degraded.
    Ticker,
    Network,
    Cpi,
    Config,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Ticker => "TICK",
            ErrorCategory::Network => "NET",
            ErrorCategory::Cpi => "CPI",
            ErrorCategory::Config => "CFG",
            ErrorCategory::Other => "ERR",
        }
    }
}

/// Cursor and sort of one table tab.
#[derive(Debug, Clone, Copy)]
pub struct TableView<C: TableColumn> {
    pub cursor: usize,
    pub sort: TableSort<C>,
}

impl<C: TableColumn> Default for TableView<C> {
    fn default() -> Self {
        Self {
            cursor: 0,
            sort: TableSort::default(),
        }
    }
}

impl<C: TableColumn> TableView<C> {
    pub fn move_down(&mut self, rows: usize) {
        if self.cursor + 1 < rows {
            self.cursor += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Keep the cursor on a row after the table shrank.
    pub fn clamp(&mut self, rows: usize) {
        self.cursor = self.cursor.min(rows.saturating_sub(1));
    }
}

/// The symbol currently being fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchProgress {
    pub symbol: String,
    pub company: String,
    pub index: usize,
    pub total: usize,
}

impl FetchProgress {
    pub fn text(&self) -> String {
        format!(
            "Fetching data for {} - {} [{}/{}]",
            self.symbol,
            self.company,
            self.index + 1,
            self.total
        )
    }
}

/// Inflation tab state: table cursor and the categories drawn on the chart.
#[derive(Debug, Clone)]
pub struct InflationView {
    pub cursor: usize,
    pub chart_categories: Vec<String>,
}

impl Default for InflationView {
    fn default() -> Self {
        Self {
            cursor: 0,
            chart_categories: DEFAULT_CHART_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl InflationView {
    /// Add the category to the chart, or remove it if already shown.
    pub fn toggle(&mut self, category: &str) {
        if let Some(pos) = self.chart_categories.iter().position(|c| c == category) {
            self.chart_categories.remove(pos);
        } else {
            self.chart_categories.push(category.to_string());
        }
    }

    pub fn is_charted(&self, category: &str) -> bool {
        self.chart_categories.iter().any(|c| c == category)
    }
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Help,
    ErrorHistory,
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_tab: Tab,
    pub running: bool,

    // Data
    pub config: DashboardConfig,
    pub outcome: Option<PollOutcome>,
    pub cpi: Option<CpiLoad>,
    pub last_update: Option<NaiveDateTime>,

    // Tab states
    pub summary: TableView<SummaryColumn>,
    pub golden: TableView<CrossColumn>,
    pub death: TableView<CrossColumn>,
    pub volume: TableView<VolumeColumn>,
    pub inflation: InflationView,

    // Polling
    pub poll_in_flight: bool,
    pub cpi_in_flight: bool,
    pub fetch_progress: Option<FetchProgress>,
    pub auto_refresh: bool,
    pub last_refresh: Option<Instant>,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<crate::worker::WorkerResponse>,
    pub cancel: Arc<AtomicBool>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,

    pub state_path: PathBuf,
}

impl AppState {
    pub fn new(
        config: DashboardConfig,
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<crate::worker::WorkerResponse>,
        cancel: Arc<AtomicBool>,
        state_path: PathBuf,
    ) -> Self {
        Self {
            active_tab: Tab::Summary,
            running: true,
            config,
            outcome: None,
            cpi: None,
            last_update: None,
            summary: TableView::default(),
            golden: TableView::default(),
            death: TableView::default(),
            volume: TableView::default(),
            inflation: InflationView::default(),
            poll_in_flight: false,
            cpi_in_flight: false,
            fetch_progress: None,
            auto_refresh: true,
            last_refresh: None,
            worker_tx,
            worker_rx,
            cancel,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::None,
            state_path,
        }
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    /// Ask the worker for a fresh poll and CPI load. Ignored while a poll
    /// is still running.
    pub fn request_refresh(&mut self) {
        if self.poll_in_flight {
            self.set_warning("Refresh already in progress");
            return;
        }
        let poll = WorkerCommand::Poll {
            config: Box::new(self.config.clone()),
        };
        if self.worker_tx.send(poll).is_err() {
            self.push_error(
                ErrorCategory::Other,
                "Background worker is not running".into(),
                String::new(),
            );
            return;
        }
        self.poll_in_flight = true;
        self.last_refresh = Some(Instant::now());

        if !self.cpi_in_flight {
            let load = WorkerCommand::LoadCpi {
                config: Box::new(self.config.clone()),
            };
            if self.worker_tx.send(load).is_ok() {
                self.cpi_in_flight = true;
            }
        }
        self.set_status("Refreshing market data...");
    }

    pub fn refresh_interval(&self) -> Duration {
        self.config.refresh_interval()
    }

    /// True when auto-refresh is on and the interval has passed since the
    /// last refresh started.
    pub fn refresh_due(&self, now: Instant) -> bool {
        self.auto_refresh
            && !self.poll_in_flight
            && self
                .last_refresh
                .is_some_and(|t| now.saturating_duration_since(t) >= self.refresh_interval())
    }

    pub fn toggle_auto_refresh(&mut self) {
        self.auto_refresh = !self.auto_refresh;
        let state = if self.auto_refresh { "on" } else { "off" };
        self.set_status(format!(
            "Auto-refresh {state} ({}s)",
            self.refresh_interval().as_secs()
        ));
    }

    /// Summary rows in the active sort order.
    pub fn summary_rows(&self) -> Vec<&TickerSnapshot> {
        let mut rows = self
            .outcome
            .as_ref()
            .map(PollOutcome::snapshots)
            .unwrap_or_default();
        self.summary.sort.apply(&mut rows);
        rows
    }

    /// Rows of a cross tab, unsorted.
    pub fn cross_rows(&self, kind: CrossKind) -> Vec<CrossRow> {
        self.outcome
            .as_ref()
            .map(|o| cross_rows(o, kind))
            .unwrap_or_default()
    }

    pub fn cross_view(&self, kind: CrossKind) -> &TableView<CrossColumn> {
        match kind {
            CrossKind::Golden => &self.golden,
            CrossKind::Death => &self.death,
        }
    }

    pub fn cross_view_mut(&mut self, kind: CrossKind) -> &mut TableView<CrossColumn> {
        match kind {
            CrossKind::Golden => &mut self.golden,
            CrossKind::Death => &mut self.death,
        }
    }

    pub fn volume_rows(&self) -> Vec<VolumeRow> {
        self.outcome.as_ref().map(volume_rows).unwrap_or_default()
    }

    pub fn cpi_rows(&self) -> Vec<&CpiObservation> {
        self.cpi
            .as_ref()
            .map(|c| c.dataset.latest_rows())
            .unwrap_or_default()
    }

    /// Number of rows the active tab's table shows.
    pub fn row_count(&self, tab: Tab) -> usize {
        match tab {
            Tab::Summary => self
                .outcome
                .as_ref()
                .map_or(0, |o| o.succeeded()),
            Tab::GoldenCross => self.cross_rows(CrossKind::Golden).len(),
            Tab::DeathCross => self.cross_rows(CrossKind::Death).len(),
            Tab::Volume => self.volume_rows().len(),
            Tab::Inflation => self.cpi_rows().len(),
        }
    }

    /// Re-clamp every cursor after new data arrived.
    pub fn clamp_cursors(&mut self) {
        let summary = self.row_count(Tab::Summary);
        let golden = self.row_count(Tab::GoldenCross);
        let death = self.row_count(Tab::DeathCross);
        let volume = self.row_count(Tab::Volume);
        let inflation = self.row_count(Tab::Inflation);
        self.summary.clamp(summary);
        self.golden.clamp(golden);
        self.death.clamp(death);
        self.volume.clamp(volume);
        self.inflation.cursor = self.inflation.cursor.min(inflation.saturating_sub(1));
    }
}

/// Sort owned rows by reference for display.
pub fn sorted<'a, C: TableColumn>(rows: &'a [C::Row], sort: &TableSort<C>) -> Vec<&'a C::Row> {
    let mut refs: Vec<&C::Row> = rows.iter().collect();
    sort.apply(&mut refs);
    refs
}
