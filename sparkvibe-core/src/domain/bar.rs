//! One trading day of OHLCV for a ticker.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar as returned by the provider.
///
/// Missing provider fields are carried as NaN (prices) or 0 (volume);
/// rows where every field is missing never become bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Volume as f64, for averaging.
    pub fn volume_f64(&self) -> f64 {
        self.volume as f64
    }
}

/// Close prices of a bar series, in order.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn bar_is_not_void() {
        assert!(!sample_bar().is_void());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(bar.is_void());
    }

    #[test]
    fn closes_preserve_order() {
        let mut second = sample_bar();
        second.close = 110.0;
        assert_eq!(closes(&[sample_bar(), second]), vec![103.0, 110.0]);
    }
}
