//! The flat per-ticker record recomputed every poll.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Fundamentals;
use crate::earnings::ResolvedEarnings;
use crate::indicators::cross::CrossEvent;

/// Everything the views need about one ticker after a poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub symbol: String,
    pub company: String,
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    pub previous_close: f64,
    pub daily_change: f64,
    pub pct_change: f64,
    pub fundamentals: Fundamentals,
    pub ma_50: Option<f64>,
    pub ma_200: Option<f64>,
    pub golden_cross: Option<CrossEvent>,
    pub death_cross: Option<CrossEvent>,
    pub earnings: Option<ResolvedEarnings>,
    pub fetched_at: NaiveDateTime,
}

impl TickerSnapshot {
    /// Average volume as reported by the provider.
    pub fn avg_volume(&self) -> Option<f64> {
        self.fundamentals.average_volume
    }

    pub fn is_up(&self) -> bool {
        self.pct_change > 0.0
    }
}
