//! Snapshot builder — turns one ticker's raw provider data into a [`TickerSnapshot`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{closes, Bar, Fundamentals, TickerSnapshot, WatchEntry};
use crate::earnings::{resolve_earnings, EarningsEvidence, EarningsFallbacks};
use crate::indicators::{detect_recent_cross, trailing_mean, CrossKind, CrossParams};

#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    #[error("No recent data available for {symbol}")]
    NoData { symbol: String },
}

/// Indicator and earnings settings applied to every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default)]
    pub cross: CrossParams,
    #[serde(default)]
    pub earnings: EarningsFallbacks,
}

/// Build the snapshot for `entry` from its bars, fundamentals and earnings evidence.
///
/// The latest bar supplies price, open, high, low and volume. Previous close is
/// the prior bar's close, else the fundamentals' previous close, else the
/// current price.
pub fn build_snapshot(
    entry: &WatchEntry,
    bars: &[Bar],
    fundamentals: Fundamentals,
    evidence: &EarningsEvidence,
    now: NaiveDateTime,
    settings: &AnalysisSettings,
) -> Result<TickerSnapshot, SnapshotError> {
    let Some(current) = bars.last() else {
        return Err(SnapshotError::NoData {
            symbol: entry.symbol.clone(),
        });
    };

    let price = current.close;
    let previous_close = if bars.len() >= 2 {
        bars[bars.len() - 2].close
    } else {
        fundamentals.previous_close.unwrap_or(price)
    };
    let daily_change = price - previous_close;
    let pct_change = if previous_close != 0.0 {
        daily_change / previous_close * 100.0
    } else {
        0.0
    };

    let params = &settings.cross;
    let close_series = closes(bars);
    let ma_50 = trailing_mean(&close_series, params.fast_period);
    let ma_200 = trailing_mean(&close_series, params.slow_period);
    let golden_cross = detect_recent_cross(&close_series, CrossKind::Golden, params);
    let death_cross = detect_recent_cross(&close_series, CrossKind::Death, params);

    let earnings = resolve_earnings(&entry.symbol, entry.kind, evidence, &settings.earnings, now);

    Ok(TickerSnapshot {
        symbol: entry.symbol.clone(),
        company: entry.name.clone(),
        price,
        open: current.open,
        high: current.high,
        low: current.low,
        volume: current.volume,
        previous_close,
        daily_change,
        pct_change,
        fundamentals,
        ma_50,
        ma_200,
        golden_cross,
        death_cross,
        earnings,
        fetched_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AssetKind;
    use crate::earnings::EarningsStatus;
    use crate::indicators::make_bars;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn apple() -> WatchEntry {
        WatchEntry::new("AAPL", "Apple Inc.", AssetKind::Equity)
    }

    #[test]
    fn no_bars_is_an_error() {
        let err = build_snapshot(
            &apple(),
            &[],
            Fundamentals::default(),
            &EarningsEvidence::default(),
            now(),
            &AnalysisSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "No recent data available for AAPL");
    }

    #[test]
    fn change_from_previous_bar() {
        let bars = make_bars(&[100.0, 102.0, 99.0]);
        let snap = build_snapshot(
            &apple(),
            &bars,
            Fundamentals::default(),
            &EarningsEvidence::default(),
            now(),
            &AnalysisSettings::default(),
        )
        .unwrap();
        assert_eq!(snap.price, 99.0);
        assert_eq!(snap.previous_close, 102.0);
        assert!((snap.daily_change + 3.0).abs() < 1e-12);
        assert!((snap.pct_change + 3.0 / 102.0 * 100.0).abs() < 1e-12);
        assert!(snap.ma_50.is_none());
        assert!(snap.golden_cross.is_none());
    }

    #[test]
    fn single_bar_uses_reported_previous_close() {
        let bars = make_bars(&[110.0]);
        let fundamentals = Fundamentals {
            previous_close: Some(100.0),
            ..Fundamentals::default()
        };
        let snap = build_snapshot(
            &apple(),
            &bars,
            fundamentals,
            &EarningsEvidence::default(),
            now(),
            &AnalysisSettings::default(),
        )
        .unwrap();
        assert_eq!(snap.previous_close, 100.0);
        assert!((snap.pct_change - 10.0).abs() < 1e-9);
    }

    #[test]
    fn single_bar_without_reference_is_flat() {
        let bars = make_bars(&[110.0]);
        let snap = build_snapshot(
            &apple(),
            &bars,
            Fundamentals::default(),
            &EarningsEvidence::default(),
            now(),
            &AnalysisSettings::default(),
        )
        .unwrap();
        assert_eq!(snap.daily_change, 0.0);
        assert_eq!(snap.pct_change, 0.0);
    }

    #[test]
    fn long_history_gets_averages_and_cross() {
        let mut closes = vec![100.0; 230];
        closes.extend(std::iter::repeat(200.0).take(20));
        let bars = make_bars(&closes);
        let snap = build_snapshot(
            &apple(),
            &bars,
            Fundamentals::default(),
            &EarningsEvidence::default(),
            now(),
            &AnalysisSettings::default(),
        )
        .unwrap();
        assert!(snap.ma_50.is_some());
        assert!(snap.ma_200.is_some());
        assert_eq!(snap.golden_cross.map(|c| c.days_ago), Some(20));
        assert!(snap.death_cross.is_none());
    }

    #[test]
    fn etf_never_has_earnings() {
        let spy = WatchEntry::new("SPY", "SPDR S&P 500 ETF", AssetKind::Etf);
        let evidence = EarningsEvidence {
            next_timestamp: Some(now()),
            ..EarningsEvidence::default()
        };
        let snap = build_snapshot(
            &spy,
            &make_bars(&[1.0, 2.0]),
            Fundamentals::default(),
            &evidence,
            now(),
            &AnalysisSettings::default(),
        )
        .unwrap();
        assert!(snap.earnings.is_none());
    }

    #[test]
    fn equity_earnings_from_evidence() {
        let upcoming = now() + chrono::Duration::days(20);
        let evidence = EarningsEvidence {
            listed_dates: vec![upcoming],
            ..EarningsEvidence::default()
        };
        let snap = build_snapshot(
            &apple(),
            &make_bars(&[1.0, 2.0]),
            Fundamentals::default(),
            &evidence,
            now(),
            &AnalysisSettings::default(),
        )
        .unwrap();
        let earnings = snap.earnings.unwrap();
        assert_eq!(earnings.date, upcoming);
        assert_eq!(earnings.status, EarningsStatus::Upcoming);
    }
}
