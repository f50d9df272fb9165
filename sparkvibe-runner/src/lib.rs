//! SparkVibe Runner — configuration, polling and the views both front ends render.
//!
//! This crate builds on `sparkvibe-core` to provide:
//! - `sparkvibe.toml` configuration with environment overrides
//! - The serial watch-list poll with per-ticker warnings
//! - Table rows, chart series and captions for every dashboard tab
//! - CPI loading with live/synthetic fallback
//! - CSV and JSON export of the summary table
//! - Logging setup shared by the binaries

pub mod config;
pub mod cpi_loader;
pub mod export;
pub mod logging;
pub mod poller;
pub mod views;

pub use config::{ConfigError, DashboardConfig, DataMode};
pub use cpi_loader::{load_cpi, CpiLoad};
pub use export::{export_summary_csv, save_summary, ExportFormat};
pub use logging::{init_logging, LogConfig, LogFormat, LogTarget};
pub use poller::{
    build_provider, poll_watchlist, PollOptions, PollOutcome, PollWarning, PolledTicker, Severity,
};
pub use views::{
    CrossColumn, MarketStatus, MarketSummary, SortDirection, SummaryColumn, TableColumn,
    TableSort, VolumeColumn,
};
