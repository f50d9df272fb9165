//! Logging setup shared by the binaries.
//!
//! `RUST_LOG` selects the filter (falling back to the given default level)
//! and `LOG_FORMAT` picks `pretty` or `compact`. The CLI logs to stderr; the
//! TUI logs to a file so the terminal stays clean.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Append to this file, creating parent directories.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub default_level: String,
    pub target: LogTarget,
}

impl LogConfig {
    /// Reads `LOG_FORMAT`; `RUST_LOG` is consulted at init time.
    pub fn from_env(default_level: &str, target: LogTarget) -> Self {
        Self {
            format: std::env::var("LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
            default_level: default_level.to_string(),
            target,
        }
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));
    let registry = tracing_subscriber::registry().with(filter);

    match &config.target {
        LogTarget::Stderr => match config.format {
            LogFormat::Pretty => registry
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?,
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()?,
        },
        LogTarget::File(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create log dir {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let writer = Mutex::new(file);
            match config.format {
                LogFormat::Pretty => registry
                    .with(fmt::layer().pretty().with_ansi(false).with_writer(writer))
                    .try_init()?,
                LogFormat::Compact => registry
                    .with(fmt::layer().compact().with_ansi(false).with_writer(writer))
                    .try_init()?,
            }
        }
    }
    Ok(())
}
