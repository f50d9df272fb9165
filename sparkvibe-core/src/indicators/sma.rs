//! Simple moving averages of closes and volumes.

use super::Indicator;
use crate::domain::Bar;

/// Rolling mean of `values`, same length as the input.
///
/// Slot `i` holds the mean of `values[i + 1 - period..=i]`; it is NaN during
/// the first `period - 1` slots and whenever the window holds a NaN.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 {
        return out;
    }

    let mut sum = 0.0;
    let mut nans = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            nans += 1;
        } else {
            sum += v;
        }
        if let Some(&old) = i.checked_sub(period).map(|j| &values[j]) {
            if old.is_nan() {
                nans -= 1;
            } else {
                sum -= old;
            }
        }
        if i + 1 >= period && nans == 0 {
            out[i] = sum / period as f64;
        }
    }
    out
}

/// Mean of the last `period` values, or `None` with fewer than `period` values.
pub fn trailing_mean(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    if mean.is_nan() {
        None
    } else {
        Some(mean)
    }
}

/// Moving average of close prices, e.g. the 50- and 200-day lines.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "moving average period must be >= 1");
        Self {
            period,
            name: format!("ma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean(&crate::domain::closes(bars), self.period)
    }
}
