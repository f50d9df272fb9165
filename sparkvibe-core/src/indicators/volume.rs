//! Volume analysis — ratio to average, rolling average, weekly trend.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::sma::rolling_mean;
use super::Indicator;
use crate::domain::Bar;

/// Ratio above which volume is flagged high.
pub const HIGH_VOLUME_RATIO: f64 = 1.5;
/// Ratio below which volume is flagged low.
pub const LOW_VOLUME_RATIO: f64 = 0.5;

/// Volume / average volume, only defined for a positive average.
pub fn volume_ratio(volume: f64, avg_volume: Option<f64>) -> Option<f64> {
    match avg_volume {
        Some(avg) if avg > 0.0 && !volume.is_nan() => Some(volume / avg),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeLevel {
    High,
    Normal,
    Low,
}

impl VolumeLevel {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > HIGH_VOLUME_RATIO {
            VolumeLevel::High
        } else if ratio < LOW_VOLUME_RATIO {
            VolumeLevel::Low
        } else {
            VolumeLevel::Normal
        }
    }

    /// Explanatory text shown under the volume metrics.
    pub fn alert_text(self, symbol: &str, ratio: f64) -> String {
        match self {
            VolumeLevel::High => format!(
                "High Volume Alert: {symbol} is trading at {ratio:.1}x its 30-day average volume. \
                 Unusually high volume may indicate significant market interest or news affecting the stock."
            ),
            VolumeLevel::Low => format!(
                "Low Volume Alert: {symbol} is trading at only {ratio:.1}x its 30-day average volume. \
                 Low volume may indicate reduced market interest or a quiet trading period."
            ),
            VolumeLevel::Normal => format!(
                "{symbol} is trading at normal volume levels relative to its 30-day average."
            ),
        }
    }
}

/// Rolling average of daily volume.
#[derive(Debug, Clone)]
pub struct AverageVolume {
    period: usize,
    name: String,
}

impl AverageVolume {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "average volume period must be >= 1");
        Self {
            period,
            name: format!("avg_volume_{period}"),
        }
    }
}

impl Indicator for AverageVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let volumes: Vec<f64> = bars.iter().map(Bar::volume_f64).collect();
        rolling_mean(&volumes, self.period)
    }
}

/// `period`-day rolling average volume, NaN during warmup.
pub fn rolling_average_volume(bars: &[Bar], period: usize) -> Vec<f64> {
    AverageVolume::new(period).compute(bars)
}

/// Latest volume against its rolling average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeMetrics {
    pub latest_volume: f64,
    /// Rolling average at the last bar; `None` during warmup.
    pub average_volume: Option<f64>,
    pub ratio: Option<f64>,
}

impl VolumeMetrics {
    pub fn from_bars(bars: &[Bar], period: usize) -> Option<Self> {
        let last = bars.last()?;
        let average_volume = rolling_average_volume(bars, period)
            .last()
            .copied()
            .filter(|v| !v.is_nan());
        let latest_volume = last.volume_f64();
        Some(Self {
            latest_volume,
            average_volume,
            ratio: volume_ratio(latest_volume, average_volume),
        })
    }

    pub fn level(&self) -> Option<VolumeLevel> {
        self.ratio.map(VolumeLevel::from_ratio)
    }
}

/// Mean daily volume per calendar week (Monday to Sunday), oldest first.
pub fn weekly_mean_volume(bars: &[Bar]) -> Vec<f64> {
    let mut weeks: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
    for bar in bars {
        let week = bar.date.iso_week();
        let entry = weeks.entry((week.year(), week.week())).or_insert((0.0, 0));
        entry.0 += bar.volume_f64();
        entry.1 += 1;
    }
    weeks
        .into_values()
        .map(|(sum, count)| sum / count as f64)
        .collect()
}

/// Percent change of the latest week's mean volume over the previous week.
///
/// Needs at least four weeks of history. A zero previous week yields 0.
pub fn weekly_volume_change(bars: &[Bar]) -> Option<f64> {
    let weekly = weekly_mean_volume(bars);
    if weekly.len() < 4 {
        return None;
    }
    let recent = weekly[weekly.len() - 1];
    let previous = weekly[weekly.len() - 2];
    if previous > 0.0 {
        Some((recent - previous) / previous * 100.0)
    } else {
        Some(0.0)
    }
}

/// "increased by X.X%" / "decreased by X.X%".
pub fn weekly_change_text(pct: f64) -> String {
    if pct > 0.0 {
        format!("increased by {pct:.1}%")
    } else {
        format!("decreased by {:.1}%", pct.abs())
    }
}
