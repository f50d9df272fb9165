//! Indicators computed from a ticker's daily bars.
//!
//! Series indicators implement [`Indicator`] and return one value per bar,
//! NaN during warmup. Cross detection and volume analysis build on the
//! rolling mean in `sma`.

pub mod cross;
pub mod sma;
pub mod volume;

pub use cross::{
    crossover_points, detect_recent_cross, scan_recent_cross, CrossEvent, CrossKind, CrossParams,
    CrossRecency,
};
pub use sma::{rolling_mean, trailing_mean, Sma};
pub use volume::{
    rolling_average_volume, volume_ratio, weekly_volume_change, AverageVolume, VolumeLevel,
    VolumeMetrics,
};

use crate::domain::Bar;

/// A per-bar series indicator.
pub trait Indicator {
    fn name(&self) -> &str;

    /// Number of leading bars that are NaN.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for first bar), high/low one point either side,
/// volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
