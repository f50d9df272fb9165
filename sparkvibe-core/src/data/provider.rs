//! Market data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over the live Yahoo Finance source
//! and the seeded mock used in development mode, so the poller and tests can
//! swap them freely.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{Bar, Fundamentals};
use crate::earnings::EarningsEvidence;

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and TUI contexts;
/// [`DataError::user_warning`] renders the dashboard's per-ticker warning.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no recent data available for {symbol}")]
    NoData { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// HTTP status this error corresponds to, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            DataError::SymbolNotFound { .. } => Some(404),
            DataError::RateLimited { .. } => Some(429),
            DataError::AuthenticationRequired(_) => Some(401),
            _ => None,
        }
    }

    /// Known provider conditions are warnings; anything else is an error.
    pub fn is_warning(&self) -> bool {
        self.http_status().is_some() || matches!(self, DataError::NoData { .. })
    }

    /// Message shown to the user when fetching `symbol` fails.
    pub fn user_warning(&self, symbol: &str) -> String {
        match self {
            DataError::SymbolNotFound { .. } => format!(
                "Symbol {symbol} not found (HTTP 404). This symbol may be delisted or invalid. \
                 Try using a different ticker format."
            ),
            DataError::RateLimited { .. } => format!(
                "Rate limit exceeded for {symbol} (HTTP 429). Too many requests to Yahoo Finance API. \
                 Try again later."
            ),
            DataError::AuthenticationRequired(_) => {
                format!("Unauthorized access for {symbol} (HTTP 401). API authentication issue.")
            }
            DataError::NoData { .. } => {
                format!("No recent data available for {symbol}. Skipping...")
            }
            other => format!("Error fetching data for {symbol}: {other}"),
        }
    }
}

/// Trait for market data providers (Yahoo Finance, mock).
///
/// Each method fails independently; the poller decides which failures drop
/// a ticker and which only degrade it.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Daily OHLCV bars for a symbol over a date range, oldest first.
    fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError>;

    /// Valuation ratios, market cap and reference values.
    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, DataError>;

    /// Every earnings-date source the provider exposes.
    fn earnings_evidence(&self, symbol: &str) -> Result<EarningsEvidence, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

/// Progress callback for a watch-list poll.
pub trait PollProgress: Send {
    /// Called when starting to fetch a symbol.
    fn on_start(&self, symbol: &str, company: &str, index: usize, total: usize);

    /// Called when a symbol fetch completes.
    fn on_complete(&self, symbol: &str, index: usize, total: usize, result: &Result<(), DataError>);

    /// Called for non-fatal problems (a degraded ticker).
    fn on_warning(&self, symbol: &str, message: &str);

    /// Called when the entire poll is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that prints to stderr, keeping stdout for tables.
pub struct ConsoleProgress;

impl PollProgress for ConsoleProgress {
    fn on_start(&self, symbol: &str, company: &str, index: usize, total: usize) {
        eprintln!("[{}/{}] Fetching data for {symbol} - {company}", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, _index: usize, _total: usize, result: &Result<(), DataError>) {
        if let Err(e) = result {
            eprintln!("  FAIL: {}", e.user_warning(symbol));
        }
    }

    fn on_warning(&self, symbol: &str, message: &str) {
        eprintln!("  WARN {symbol}: {message}");
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        eprintln!("Poll complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Progress reporter that discards everything.
pub struct SilentProgress;

impl PollProgress for SilentProgress {
    fn on_start(&self, _: &str, _: &str, _: usize, _: usize) {}
    fn on_complete(&self, _: &str, _: usize, _: usize, _: &Result<(), DataError>) {}
    fn on_warning(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize) {}
}
