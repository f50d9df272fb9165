//! Moving average crossover detection — golden cross and death cross.
//!
//! A golden cross is the bar where the fast MA closes above the slow MA after
//! being at or below it on the previous bar. A death cross is the mirror.
//! Any comparison involving NaN (warmup) is never a cross.

use serde::{Deserialize, Serialize};

use super::sma::rolling_mean;

/// Which crossover to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossKind {
    Golden,
    Death,
}

impl CrossKind {
    pub fn label(self) -> &'static str {
        match self {
            CrossKind::Golden => "Golden Cross",
            CrossKind::Death => "Death Cross",
        }
    }

    /// True when the (prev, cur) pair of fast/slow values forms this cross.
    pub fn is_cross(self, fast_cur: f64, slow_cur: f64, fast_prev: f64, slow_prev: f64) -> bool {
        if fast_cur.is_nan() || slow_cur.is_nan() || fast_prev.is_nan() || slow_prev.is_nan() {
            return false;
        }
        match self {
            CrossKind::Golden => fast_cur > slow_cur && fast_prev <= slow_prev,
            CrossKind::Death => fast_cur < slow_cur && fast_prev >= slow_prev,
        }
    }
}

/// Periods and windows used for cross detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossParams {
    pub fast_period: usize,
    pub slow_period: usize,
    /// Bars back from the latest to search (inclusive).
    pub lookback: usize,
    /// Trailing slice of the MA series the scan runs over.
    pub window: usize,
}

impl Default for CrossParams {
    fn default() -> Self {
        Self {
            fast_period: 50,
            slow_period: 200,
            lookback: 30,
            window: 60,
        }
    }
}

/// A detected cross, `days_ago` bars back from the latest (1 = latest bar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossEvent {
    pub kind: CrossKind,
    pub days_ago: usize,
}

impl CrossEvent {
    pub fn recency(&self) -> CrossRecency {
        CrossRecency::from_days(self.days_ago)
    }

    /// Summary-table cell, e.g. `🟢 (12d ago)`.
    pub fn summary_cell(&self) -> String {
        format!("{} ({}d ago)", self.recency().light(), self.days_ago)
    }

    /// Cross-tab cell, e.g. `🟡 21d ago`.
    pub fn tab_cell(&self) -> String {
        format!("{} {}d ago", self.recency().light(), self.days_ago)
    }
}

/// Summary-table cell for an optional cross; no cross renders as a red light.
pub fn summary_cell(event: Option<&CrossEvent>) -> String {
    match event {
        Some(e) => e.summary_cell(),
        None => CrossRecency::Stale.light().to_string(),
    }
}

/// Traffic light for how recent a cross is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossRecency {
    /// Within 15 days.
    Fresh,
    /// 16 to 30 days.
    Recent,
    Stale,
}

impl CrossRecency {
    pub fn from_days(days_ago: usize) -> Self {
        match days_ago {
            d if d <= 15 => CrossRecency::Fresh,
            d if d <= 30 => CrossRecency::Recent,
            _ => CrossRecency::Stale,
        }
    }

    pub fn light(self) -> &'static str {
        match self {
            CrossRecency::Fresh => "🟢",
            CrossRecency::Recent => "🟡",
            CrossRecency::Stale => "🔴",
        }
    }
}

/// Scan precomputed fast/slow series for the most recent cross of `kind`.
///
/// Only the trailing `params.window` values are considered. Offset `i` compares
/// the bar `i` back from the end against the bar before it, for
/// `i in 1..min(lookback + 1, window_len)`. The first hit wins.
pub fn scan_recent_cross(
    fast: &[f64],
    slow: &[f64],
    kind: CrossKind,
    params: &CrossParams,
) -> Option<CrossEvent> {
    let len = fast.len().min(slow.len());
    let start = len.saturating_sub(params.window);
    let fast = &fast[start..len];
    let slow = &slow[start..len];
    let n = fast.len();

    let upper = (params.lookback + 1).min(n);
    for i in 1..upper {
        let cur = n - i;
        let prev = cur - 1;
        if kind.is_cross(fast[cur], slow[cur], fast[prev], slow[prev]) {
            return Some(CrossEvent { kind, days_ago: i });
        }
    }
    None
}

/// Detect a recent cross of `kind` in a close-price series.
///
/// Needs at least `slow_period` closes; shorter histories never report a cross.
pub fn detect_recent_cross(
    closes: &[f64],
    kind: CrossKind,
    params: &CrossParams,
) -> Option<CrossEvent> {
    if closes.len() < params.slow_period {
        return None;
    }
    let fast = rolling_mean(closes, params.fast_period);
    let slow = rolling_mean(closes, params.slow_period);
    scan_recent_cross(&fast, &slow, kind, params)
}

/// Every index `i >= 1` in the full series where a cross of `kind` occurs.
pub fn crossover_points(fast: &[f64], slow: &[f64], kind: CrossKind) -> Vec<usize> {
    let len = fast.len().min(slow.len());
    (1..len)
        .filter(|&i| kind.is_cross(fast[i], slow[i], fast[i - 1], slow[i - 1]))
        .collect()
}
