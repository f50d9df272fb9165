//! Watch-list — the fixed set of tickers the dashboard polls.
//!
//! The default list is built in; a TOML file with `[[ticker]]` tables can
//! replace it. Display order always puts the locked symbols first.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{AssetKind, WatchEntry};

/// Symbols always shown first, in this order.
pub const LOCKED_SYMBOLS: [&str; 3] = ["^VIX", "SPY", "QQQ"];

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("read watch-list file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse watch-list TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize watch-list: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("watch-list is empty")]
    Empty,

    #[error("duplicate symbol in watch-list: {0}")]
    Duplicate(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Watchlist {
    #[serde(rename = "ticker")]
    entries: Vec<WatchEntry>,
}

impl Watchlist {
    pub fn new(entries: Vec<WatchEntry>) -> Result<Self, WatchlistError> {
        if entries.is_empty() {
            return Err(WatchlistError::Empty);
        }
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.symbol == entry.symbol) {
                return Err(WatchlistError::Duplicate(entry.symbol.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn from_file(path: &Path) -> Result<Self, WatchlistError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, WatchlistError> {
        let parsed: Watchlist = toml::from_str(content)?;
        Self::new(parsed.entries)
    }

    pub fn to_toml(&self) -> Result<String, WatchlistError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Entries in list order.
    pub fn entries(&self) -> &[WatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&WatchEntry> {
        self.entries.iter().find(|e| e.symbol == symbol)
    }

    pub fn company(&self, symbol: &str) -> Option<&str> {
        self.get(symbol).map(|e| e.name.as_str())
    }

    /// Locked symbols first (if present), then the rest in list order.
    pub fn display_order(&self) -> Vec<&WatchEntry> {
        let mut ordered: Vec<&WatchEntry> = LOCKED_SYMBOLS
            .iter()
            .filter_map(|s| self.get(s))
            .collect();
        ordered.extend(
            self.entries
                .iter()
                .filter(|e| !LOCKED_SYMBOLS.contains(&e.symbol.as_str())),
        );
        ordered
    }

    /// The built-in watch-list.
    pub fn default_list() -> Self {
        use AssetKind::*;
        let rows: [(&str, &str, AssetKind); 37] = [
            ("SPY", "SPDR S&P 500 ETF", Etf),
            ("^VIX", "CBOE Volatility Index", Index),
            ("QQQ", "Invesco QQQ Trust", Etf),
            ("AAPL", "Apple Inc.", Equity),
            ("AMD", "Advanced Micro Devices", Equity),
            ("AMZN", "Amazon.com Inc.", Equity),
            ("ASML", "ASML Holding N.V.", Equity),
            ("AVGO", "Broadcom Inc.", Equity),
            ("BLK", "BlackRock Inc.", Equity),
            ("BKNG", "Booking Holdings Inc.", Equity),
            ("BTC-USD", "Bitcoin USD", Crypto),
            ("CDNS", "Cadence Design Systems", Equity),
            ("COST", "Costco Wholesale Corp.", Equity),
            ("CRM", "Salesforce Inc.", Equity),
            ("CRSP", "CRISPR Therapeutics AG", Equity),
            ("CRWD", "CrowdStrike Holdings", Equity),
            ("EXPE", "Expedia Group Inc.", Equity),
            ("GLD", "SPDR Gold Shares", Etf),
            ("GOOGL", "Alphabet Inc.", Equity),
            ("INTU", "Intuit Inc.", Equity),
            ("LCID", "Lucid Group Inc.", Equity),
            ("META", "Meta Platforms Inc.", Equity),
            ("MSFT", "Microsoft Corporation", Equity),
            ("NFLX", "Netflix Inc.", Equity),
            ("NTLA", "Intellia Therapeutics", Equity),
            ("NVDA", "NVIDIA Corporation", Equity),
            ("PLTR", "Palantir Technologies", Equity),
            ("QCOM", "Qualcomm Inc.", Equity),
            ("RIVN", "Rivian Automotive", Equity),
            ("SHOP", "Shopify Inc.", Equity),
            ("SLV", "iShares Silver Trust", Etf),
            ("SNOW", "Snowflake Inc.", Equity),
            ("SNPS", "Synopsys Inc.", Equity),
            ("TGT", "Target Corporation", Equity),
            ("TSLA", "Tesla Inc.", Equity),
            ("TSM", "Taiwan Semiconductor", Equity),
            ("WMT", "Walmart Inc.", Equity),
        ];
        Self {
            entries: rows
                .into_iter()
                .map(|(symbol, name, kind)| WatchEntry::new(symbol, name, kind))
                .collect(),
        }
    }
}

impl Default for Watchlist {
    fn default() -> Self {
        Self::default_list()
    }
}
