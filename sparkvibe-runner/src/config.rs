//! Dashboard configuration loaded from `sparkvibe.toml`.
//!
//! Every field has a default, so an absent or partial file is fine. The
//! environment can override the data mode (`SPARKVIBE_MODE`) and the BLS
//! registration key (`SPARKVIBE_BLS_KEY`).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sparkvibe_core::analysis::AnalysisSettings;
use sparkvibe_core::earnings::EarningsFallbacks;
use sparkvibe_core::indicators::CrossParams;
use sparkvibe_core::watchlist::{Watchlist, WatchlistError};

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "sparkvibe.toml";

pub const ENV_MODE: &str = "SPARKVIBE_MODE";
pub const ENV_BLS_KEY: &str = "SPARKVIBE_BLS_KEY";

/// Longest history window a poll may request, about ten years.
pub const MAX_HISTORY_DAYS: i64 = 3650;

const LIVE_REQUEST_DELAY_MS: u64 = 100;
const MOCK_REQUEST_DELAY_MS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("watch-list: {0}")]
    Watchlist(#[from] WatchlistError),
}

/// Where market data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    #[default]
    Live,
    Mock,
}

impl DataMode {
    pub fn label(self) -> &'static str {
        match self {
            DataMode::Live => "live",
            DataMode::Mock => "mock",
        }
    }
}

impl FromStr for DataMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(DataMode::Live),
            "mock" | "dev" | "development" => Ok(DataMode::Mock),
            other => Err(ConfigError::Invalid(format!("unknown data mode '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub mode: DataMode,
    /// Calendar days of daily history requested per ticker.
    pub history_days: i64,
    /// Pause between tickers; defaults to 100 ms live, 10 ms mock.
    pub request_delay_ms: Option<u64>,
    /// Auto-refresh period in the TUI.
    pub refresh_secs: u64,
    /// Provider retries with exponential backoff.
    pub max_retries: u32,
    /// Seed for mock data; unset means a fresh seed per run.
    pub mock_seed: Option<u64>,
    /// Replacement watch-list file.
    pub watchlist: Option<PathBuf>,
    pub bls_key: Option<String>,
    pub cross: CrossParams,
    pub earnings: EarningsFallbacks,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            mode: DataMode::Live,
            history_days: 730,
            request_delay_ms: None,
            refresh_secs: 30,
            max_retries: 0,
            mock_seed: None,
            watchlist: None,
            bls_key: None,
            cross: CrossParams::default(),
            earnings: EarningsFallbacks::default(),
        }
    }
}

impl DashboardConfig {
    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        // Relative watch-list paths are relative to the config file.
        if let (Some(list), Some(dir)) = (config.watchlist.as_mut(), path.parent()) {
            if list.is_relative() {
                *list = dir.join(&*list);
            }
        }
        Ok(config)
    }

    /// Load `path`, or `sparkvibe.toml` if present, or defaults; then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        tracing::debug!(mode = config.mode.label(), "configuration loaded");
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_MODE) {
            self.mode = mode.parse()?;
        }
        if let Some(key) = lookup(ENV_BLS_KEY).filter(|k| !k.trim().is_empty()) {
            self.bls_key = Some(key);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if !(1..=MAX_HISTORY_DAYS).contains(&self.history_days) {
            return invalid(format!(
                "history_days must be between 1 and {MAX_HISTORY_DAYS}, got {}",
                self.history_days
            ));
        }
        if self.refresh_secs == 0 {
            return invalid("refresh_secs must be at least 1".into());
        }
        let c = &self.cross;
        if c.fast_period == 0 || c.fast_period >= c.slow_period {
            return invalid(format!(
                "cross.fast_period ({}) must be positive and below cross.slow_period ({})",
                c.fast_period, c.slow_period
            ));
        }
        if c.lookback == 0 || c.window <= c.lookback {
            return invalid(format!(
                "cross.window ({}) must exceed cross.lookback ({}) and lookback must be positive",
                c.window, c.lookback
            ));
        }
        for (symbol, months) in &self.earnings.typical_months {
            if let Some(m) = months.iter().find(|m| !(1..=12).contains(*m)) {
                return invalid(format!("earnings.typical_months.{symbol}: month {m} out of range"));
            }
        }
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        let ms = self.request_delay_ms.unwrap_or(match self.mode {
            DataMode::Live => LIVE_REQUEST_DELAY_MS,
            DataMode::Mock => MOCK_REQUEST_DELAY_MS,
        });
        Duration::from_millis(ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn analysis(&self) -> AnalysisSettings {
        AnalysisSettings {
            cross: self.cross,
            earnings: self.earnings.clone(),
        }
    }

    /// The configured watch-list, or the built-in one.
    pub fn load_watchlist(&self) -> Result<Watchlist, ConfigError> {
        match &self.watchlist {
            Some(path) => Ok(Watchlist::from_file(path)?),
            None => Ok(Watchlist::default_list()),
        }
    }
}
