//! Earnings-date resolution chain.
//!
//! The provider exposes several partial, independently failing sources of
//! earnings dates. [`resolve_earnings`] tries them in a fixed priority order,
//! then falls back to configured pinned dates and finally to an estimate from
//! the company's typical reporting months. `now` is injected so the chain is
//! a pure function.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::AssetKind;

/// Most earnings-history dates considered.
pub const EARNINGS_HISTORY_LIMIT: usize = 20;

/// A resolved date older than this many days is replaced by a pinned date.
pub const PINNED_STALE_DAYS: i64 = 30;

/// Day of month used for estimated dates.
pub const ESTIMATE_DAY: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EarningsStatus {
    Upcoming,
    Past,
    Estimated,
}

impl EarningsStatus {
    pub fn label(self) -> &'static str {
        match self {
            EarningsStatus::Upcoming => "upcoming",
            EarningsStatus::Past => "past",
            EarningsStatus::Estimated => "estimated",
        }
    }

    fn relative_to(date: NaiveDateTime, now: NaiveDateTime) -> Self {
        if date > now {
            EarningsStatus::Upcoming
        } else {
            EarningsStatus::Past
        }
    }
}

/// Which link of the chain produced the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningsSource {
    ListedDates,
    Calendar,
    History,
    NextTimestamp,
    Pinned,
    TypicalMonths,
}

impl EarningsSource {
    pub fn label(self) -> &'static str {
        match self {
            EarningsSource::ListedDates => "listed earnings dates",
            EarningsSource::Calendar => "earnings calendar",
            EarningsSource::History => "earnings history",
            EarningsSource::NextTimestamp => "next earnings timestamp",
            EarningsSource::Pinned => "pinned dates",
            EarningsSource::TypicalMonths => "typical reporting months",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEarnings {
    pub date: NaiveDateTime,
    pub status: EarningsStatus,
    pub source: EarningsSource,
}

impl ResolvedEarnings {
    fn relative(date: NaiveDateTime, source: EarningsSource, now: NaiveDateTime) -> Self {
        Self {
            date,
            status: EarningsStatus::relative_to(date, now),
            source,
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }
}

/// Raw earnings evidence gathered from the provider. Any field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarningsEvidence {
    /// Dates listed on the fundamentals record.
    pub listed_dates: Vec<NaiveDateTime>,
    /// Dates from the earnings calendar.
    pub calendar_dates: Vec<NaiveDateTime>,
    /// Past and scheduled report dates, newest first as the provider returns them.
    pub history: Vec<NaiveDateTime>,
    /// Next earnings timestamp from the quote record.
    pub next_timestamp: Option<NaiveDateTime>,
}

impl EarningsEvidence {
    pub fn is_empty(&self) -> bool {
        self.listed_dates.is_empty()
            && self.calendar_dates.is_empty()
            && self.history.is_empty()
            && self.next_timestamp.is_none()
    }
}

/// Configured fallbacks applied after the provider sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarningsFallbacks {
    /// Months (1-12) in which a company usually reports.
    pub typical_months: BTreeMap<String, Vec<u32>>,
    /// Known report dates per symbol.
    pub pinned_dates: BTreeMap<String, Vec<NaiveDate>>,
}

impl Default for EarningsFallbacks {
    fn default() -> Self {
        let mut typical_months = BTreeMap::new();
        for symbol in ["AAPL", "MSFT", "AMZN", "GOOGL", "META", "TSLA", "AMD"] {
            typical_months.insert(symbol.to_string(), vec![1, 4, 7, 10]);
        }
        typical_months.insert("NVDA".to_string(), vec![2, 5, 8, 11]);

        let mut pinned_dates = BTreeMap::new();
        let meta: Vec<NaiveDate> = [
            (2023, 10, 25),
            (2024, 2, 1),
            (2024, 4, 24),
            (2024, 7, 30),
            (2024, 10, 29),
            (2025, 1, 29),
            (2025, 4, 30),
            (2025, 7, 30),
        ]
        .into_iter()
        .filter_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .collect();
        pinned_dates.insert("META".to_string(), meta);

        Self {
            typical_months,
            pinned_dates,
        }
    }
}

impl EarningsFallbacks {
    /// No pinned dates and no typical months.
    pub fn none() -> Self {
        Self {
            typical_months: BTreeMap::new(),
            pinned_dates: BTreeMap::new(),
        }
    }

    pub fn pinned_for(&self, symbol: &str) -> &[NaiveDate] {
        self.pinned_dates
            .get(symbol)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Resolve the earnings date for `symbol`.
///
/// Non-equities resolve to `None` without looking at any source.
pub fn resolve_earnings(
    symbol: &str,
    kind: AssetKind,
    evidence: &EarningsEvidence,
    fallbacks: &EarningsFallbacks,
    now: NaiveDateTime,
) -> Option<ResolvedEarnings> {
    if !kind.has_earnings() {
        return None;
    }

    let mut resolved = evidence
        .listed_dates
        .first()
        .map(|d| ResolvedEarnings::relative(*d, EarningsSource::ListedDates, now))
        .or_else(|| {
            evidence
                .calendar_dates
                .first()
                .map(|d| ResolvedEarnings::relative(*d, EarningsSource::Calendar, now))
        })
        .or_else(|| from_history(&evidence.history, now))
        .or_else(|| {
            evidence
                .next_timestamp
                .map(|d| ResolvedEarnings::relative(d, EarningsSource::NextTimestamp, now))
        });

    if is_stale(resolved.as_ref(), now) {
        if let Some(pinned) = from_pinned(fallbacks.pinned_for(symbol), now) {
            resolved = Some(pinned);
        }
    }

    if resolved.is_none() {
        if let Some(months) = fallbacks.typical_months.get(symbol) {
            resolved = estimate_from_months(months, now);
        }
    }

    resolved
}

/// Earliest future date in the history, else the most recent past one.
fn from_history(history: &[NaiveDateTime], now: NaiveDateTime) -> Option<ResolvedEarnings> {
    let mut dates: Vec<NaiveDateTime> = Vec::new();
    for d in history.iter().take(EARNINGS_HISTORY_LIMIT) {
        if !dates.contains(d) {
            dates.push(*d);
        }
    }

    if let Some(next) = dates.iter().filter(|d| **d > now).min() {
        return Some(ResolvedEarnings {
            date: *next,
            status: EarningsStatus::Upcoming,
            source: EarningsSource::History,
        });
    }

    dates
        .iter()
        .filter(|d| **d <= now)
        .max()
        .map(|last| ResolvedEarnings {
            date: *last,
            status: EarningsStatus::Past,
            source: EarningsSource::History,
        })
}

fn is_stale(resolved: Option<&ResolvedEarnings>, now: NaiveDateTime) -> bool {
    match resolved {
        None => true,
        Some(r) => r.date < now && (now - r.date).num_days() > PINNED_STALE_DAYS,
    }
}

/// Earliest pinned date after `now`, else the latest pinned date.
fn from_pinned(pinned: &[NaiveDate], now: NaiveDateTime) -> Option<ResolvedEarnings> {
    let dates: Vec<NaiveDateTime> = pinned.iter().map(midnight).collect();
    let chosen = dates
        .iter()
        .filter(|d| **d > now)
        .min()
        .or_else(|| dates.iter().max())?;
    Some(ResolvedEarnings::relative(
        *chosen,
        EarningsSource::Pinned,
        now,
    ))
}

/// The 15th of the first typical month after the current one, rolling into next year.
fn estimate_from_months(months: &[u32], now: NaiveDateTime) -> Option<ResolvedEarnings> {
    let mut months: Vec<u32> = months.iter().copied().filter(|m| (1..=12).contains(m)).collect();
    months.sort_unstable();
    let first = *months.first()?;

    let (year, month) = match months.iter().find(|m| **m > now.month()) {
        Some(m) => (now.year(), *m),
        None => (now.year() + 1, first),
    };

    let date = NaiveDate::from_ymd_opt(year, month, ESTIMATE_DAY)?;
    Some(ResolvedEarnings {
        date: midnight(&date),
        status: EarningsStatus::Estimated,
        source: EarningsSource::TypicalMonths,
    })
}

fn midnight(date: &NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn now() -> NaiveDateTime {
        at(2024, 5, 10)
    }

    fn resolve(symbol: &str, evidence: &EarningsEvidence, fallbacks: &EarningsFallbacks) -> Option<ResolvedEarnings> {
        resolve_earnings(symbol, AssetKind::Equity, evidence, fallbacks, now())
    }

    #[test]
    fn non_equity_is_never_resolved() {
        let evidence = EarningsEvidence {
            listed_dates: vec![at(2024, 6, 1)],
            ..Default::default()
        };
        for kind in [AssetKind::Etf, AssetKind::Index, AssetKind::Crypto] {
            assert!(resolve_earnings("SPY", kind, &evidence, &EarningsFallbacks::default(), now()).is_none());
        }
    }

    #[test]
    fn listed_dates_win_over_everything() {
        let evidence = EarningsEvidence {
            listed_dates: vec![at(2024, 7, 25), at(2024, 7, 29)],
            calendar_dates: vec![at(2024, 8, 1)],
            history: vec![at(2024, 4, 25)],
            next_timestamp: Some(at(2024, 9, 1)),
        };
        let r = resolve("AAPL", &evidence, &EarningsFallbacks::none()).unwrap();
        assert_eq!(r.source, EarningsSource::ListedDates);
        assert_eq!(r.date, at(2024, 7, 25));
        assert_eq!(r.status, EarningsStatus::Upcoming);
    }

    #[test]
    fn listed_past_date_is_marked_past() {
        let evidence = EarningsEvidence {
            listed_dates: vec![at(2024, 5, 1)],
            ..Default::default()
        };
        let r = resolve("AAPL", &evidence, &EarningsFallbacks::none()).unwrap();
        assert_eq!(r.status, EarningsStatus::Past);
    }

    #[test]
    fn date_equal_to_now_is_past() {
        let evidence = EarningsEvidence {
            listed_dates: vec![now()],
            ..Default::default()
        };
        let r = resolve("AAPL", &evidence, &EarningsFallbacks::none()).unwrap();
        assert_eq!(r.status, EarningsStatus::Past);
    }

    #[test]
    fn calendar_is_second() {
        let evidence = EarningsEvidence {
            calendar_dates: vec![at(2024, 8, 1)],
            history: vec![at(2024, 4, 25)],
            next_timestamp: Some(at(2024, 9, 1)),
            ..Default::default()
        };
        let r = resolve("AAPL", &evidence, &EarningsFallbacks::none()).unwrap();
        assert_eq!(r.source, EarningsSource::Calendar);
        assert_eq!(r.date, at(2024, 8, 1));
        assert_eq!(r.status, EarningsStatus::Upcoming);
    }

    #[test]
    fn history_prefers_nearest_future() {
        let evidence = EarningsEvidence {
            history: vec![
                at(2024, 10, 30),
                at(2024, 7, 30),
                at(2024, 7, 30),
                at(2024, 4, 24),
                at(2024, 1, 31),
            ],
            next_timestamp: Some(at(2024, 9, 1)),
            ..Default::default()
        };
        let r = resolve("AAPL", &evidence, &EarningsFallbacks::none()).unwrap();
        assert_eq!(r.source, EarningsSource::History);
        assert_eq!(r.date, at(2024, 7, 30));
        assert_eq!(r.status, EarningsStatus::Upcoming);
    }

    #[test]
    fn history_falls_back_to_latest_past() {
        let evidence = EarningsEvidence {
            history: vec![at(2024, 1, 31), at(2024, 4, 24), at(2023, 10, 26)],
            ..Default::default()
        };
        let r = resolve("AAPL", &evidence, &EarningsFallbacks::none()).unwrap();
        assert_eq!(r.date, at(2024, 4, 24));
        assert_eq!(r.status, EarningsStatus::Past);
    }

    #[test]
    fn history_beyond_limit_is_ignored() {
        let mut history = vec![at(2020, 1, 1); EARNINGS_HISTORY_LIMIT];
        history.push(at(2024, 6, 1));
        let evidence = EarningsEvidence {
            history,
            ..Default::default()
        };
        let r = resolve("AAPL", &evidence, &EarningsFallbacks::none()).unwrap();
        assert_eq!(r.date, at(2020, 1, 1));
    }

    #[test]
    fn next_timestamp_is_fourth() {
        let evidence = EarningsEvidence {
            next_timestamp: Some(at(2024, 9, 1)),
            ..Default::default()
        };
        let r = resolve("AAPL", &evidence, &EarningsFallbacks::none()).unwrap();
        assert_eq!(r.source, EarningsSource::NextTimestamp);
        assert_eq!(r.status, EarningsStatus::Upcoming);
    }

    #[test]
    fn pinned_replaces_stale_date() {
        let mut fallbacks = EarningsFallbacks::none();
        fallbacks.pinned_dates.insert(
            "META".into(),
            vec![
                NaiveDate::from_ymd_opt(2024, 4, 24).unwrap(),
                NaiveDate::from_ymd_opt(2024, 7, 30).unwrap(),
            ],
        );
        // 2024-02-01 is more than 30 days before now.
        let evidence = EarningsEvidence {
            listed_dates: vec![at(2024, 2, 1)],
            ..Default::default()
        };
        let r = resolve("META", &evidence, &fallbacks).unwrap();
        assert_eq!(r.source, EarningsSource::Pinned);
        assert_eq!(r.day(), NaiveDate::from_ymd_opt(2024, 7, 30).unwrap());
        assert_eq!(r.status, EarningsStatus::Upcoming);
    }

    #[test]
    fn pinned_keeps_recent_past_date() {
        let mut fallbacks = EarningsFallbacks::none();
        fallbacks
            .pinned_dates
            .insert("META".into(), vec![NaiveDate::from_ymd_opt(2024, 7, 30).unwrap()]);
        let evidence = EarningsEvidence {
            listed_dates: vec![at(2024, 4, 24)],
            ..Default::default()
        };
        let r = resolve("META", &evidence, &fallbacks).unwrap();
        assert_eq!(r.source, EarningsSource::ListedDates);
    }

    #[test]
    fn pinned_all_past_uses_latest() {
        let fallbacks = EarningsFallbacks::default();
        let later = at(2026, 1, 10);
        let r = resolve_earnings(
            "META",
            AssetKind::Equity,
            &EarningsEvidence::default(),
            &fallbacks,
            later,
        )
        .unwrap();
        assert_eq!(r.source, EarningsSource::Pinned);
        assert_eq!(r.day(), NaiveDate::from_ymd_opt(2025, 7, 30).unwrap());
        assert_eq!(r.status, EarningsStatus::Past);
    }

    #[test]
    fn typical_months_estimate_next_month() {
        let r = resolve("NVDA", &EarningsEvidence::default(), &EarningsFallbacks::default()).unwrap();
        assert_eq!(r.source, EarningsSource::TypicalMonths);
        assert_eq!(r.status, EarningsStatus::Estimated);
        assert_eq!(r.day(), NaiveDate::from_ymd_opt(2024, 8, 15).unwrap());
    }

    #[test]
    fn typical_months_same_month_rolls_forward() {
        // Current month 4 is not strictly greater than 4, so July is next.
        let r = resolve_earnings(
            "AAPL",
            AssetKind::Equity,
            &EarningsEvidence::default(),
            &EarningsFallbacks::default(),
            at(2024, 4, 2),
        )
        .unwrap();
        assert_eq!(r.day(), NaiveDate::from_ymd_opt(2024, 7, 15).unwrap());
    }

    #[test]
    fn typical_months_wrap_into_next_year() {
        let r = resolve_earnings(
            "AAPL",
            AssetKind::Equity,
            &EarningsEvidence::default(),
            &EarningsFallbacks::default(),
            at(2024, 11, 20),
        )
        .unwrap();
        assert_eq!(r.day(), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    }

    #[test]
    fn unknown_equity_without_evidence_is_unresolved() {
        assert!(resolve("CRSP", &EarningsEvidence::default(), &EarningsFallbacks::default()).is_none());
    }
}
