//! View models derived from a poll: the rows, chart series and captions each
//! dashboard tab renders. Both the TUI and the CLI build their output from
//! these, so the two front ends always agree.
//!
//! Failed tickers never reach a view; every builder walks
//! [`PollOutcome::tickers`], which skips empty slots.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use sparkvibe_core::domain::{closes, Bar, TickerSnapshot};
use sparkvibe_core::earnings::{EarningsEvidence, EarningsFallbacks};
use sparkvibe_core::format::{
    format_date, format_multiple, format_pct_change, format_price, format_ratio, format_volume,
    NOT_AVAILABLE,
};
use sparkvibe_core::indicators::cross::summary_cell;
use sparkvibe_core::indicators::volume::weekly_change_text;
use sparkvibe_core::indicators::{
    crossover_points, rolling_average_volume, rolling_mean, volume_ratio, weekly_volume_change,
    CrossEvent, CrossKind, CrossParams, VolumeLevel, VolumeMetrics,
};

use crate::poller::{PollOutcome, PolledTicker};

/// Bars shown on the cross charts.
pub const CHART_BARS: usize = 250;

/// Rolling window of the volume chart's average line.
pub const VOLUME_AVG_PERIOD: usize = 30;

const MARKET_OPEN_HOUR: u32 = 9;
const MARKET_CLOSE_HOUR: u32 = 16;

// ─── Sorting ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// What a row is ordered by in one column.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey<'a> {
    Text(&'a str),
    /// Missing values sort last in either direction.
    Number(Option<f64>),
}

impl SortKey<'_> {
    fn compare(&self, other: &Self, direction: SortDirection) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => direction.apply(a.cmp(b)),
            (SortKey::Number(a), SortKey::Number(b)) => {
                let a = a.filter(|v| !v.is_nan());
                let b = b.filter(|v| !v.is_nan());
                match (a, b) {
                    (Some(a), Some(b)) => {
                        direction.apply(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
                    }
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
            _ => Ordering::Equal,
        }
    }
}

/// A column of a sortable table over rows of type `Row`.
pub trait TableColumn: Copy + PartialEq + 'static {
    type Row;

    const ALL: &'static [Self];

    fn header(self) -> &'static str;

    fn cell(self, row: &Self::Row) -> String;

    fn sort_key(self, row: &Self::Row) -> SortKey<'_>;

    /// Direction a fresh sort on this column starts with.
    fn default_direction(self) -> SortDirection {
        SortDirection::Ascending
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

/// Active sort of one table; `None` keeps display order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableSort<C: TableColumn> {
    pub column: Option<C>,
    pub direction: SortDirection,
}

impl<C: TableColumn> Default for TableSort<C> {
    fn default() -> Self {
        Self {
            column: None,
            direction: SortDirection::Ascending,
        }
    }
}

impl<C: TableColumn> TableSort<C> {
    /// Display order, then every column in turn, then back to display order.
    pub fn cycle(&mut self) {
        self.column = match self.column {
            None => Some(C::ALL[0]),
            Some(c) if c.index() + 1 == C::ALL.len() => None,
            Some(c) => Some(c.next()),
        };
        if let Some(c) = self.column {
            self.direction = c.default_direction();
        }
    }

    pub fn reverse(&mut self) {
        self.direction = self.direction.toggle();
    }

    /// Stable sort, so ties keep display order.
    pub fn apply(&self, rows: &mut [&C::Row]) {
        if let Some(column) = self.column {
            rows.sort_by(|a, b| {
                column
                    .sort_key(a)
                    .compare(&column.sort_key(b), self.direction)
            });
        }
    }

    pub fn label(&self) -> String {
        match self.column {
            Some(c) => format!("{} {}", c.header(), self.direction.arrow()),
            None => "display order".to_string(),
        }
    }
}

// ─── Summary table ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SummaryColumn {
    Symbol,
    Company,
    Price,
    ChangePct,
    Volume,
    AvgVolume,
    MarketCap,
    Pe,
    Eps,
    Peg,
    Pb,
    Ma50,
    Ma200,
    GoldenCross,
    DeathCross,
    EarningsDate,
}

impl SummaryColumn {
    /// Raw value for numeric columns; cross columns give days ago.
    pub fn value(self, s: &TickerSnapshot) -> Option<f64> {
        let f = &s.fundamentals;
        let value = match self {
            SummaryColumn::Price => Some(s.price),
            SummaryColumn::ChangePct => Some(s.pct_change),
            SummaryColumn::Volume => Some(s.volume as f64),
            SummaryColumn::AvgVolume => s.avg_volume(),
            SummaryColumn::MarketCap => f.market_cap,
            SummaryColumn::Pe => f.pe_ratio(),
            SummaryColumn::Eps => f.eps(),
            SummaryColumn::Peg => f.peg_ratio,
            SummaryColumn::Pb => f.price_to_book,
            SummaryColumn::Ma50 => s.ma_50,
            SummaryColumn::Ma200 => s.ma_200,
            SummaryColumn::GoldenCross => s.golden_cross.map(|c| c.days_ago as f64),
            SummaryColumn::DeathCross => s.death_cross.map(|c| c.days_ago as f64),
            SummaryColumn::Symbol | SummaryColumn::Company | SummaryColumn::EarningsDate => None,
        };
        value.filter(|v| !v.is_nan())
    }
}

impl TableColumn for SummaryColumn {
    type Row = TickerSnapshot;

    const ALL: &'static [Self] = &[
        SummaryColumn::Symbol,
        SummaryColumn::Company,
        SummaryColumn::Price,
        SummaryColumn::ChangePct,
        SummaryColumn::Volume,
        SummaryColumn::AvgVolume,
        SummaryColumn::MarketCap,
        SummaryColumn::Pe,
        SummaryColumn::Eps,
        SummaryColumn::Peg,
        SummaryColumn::Pb,
        SummaryColumn::Ma50,
        SummaryColumn::Ma200,
        SummaryColumn::GoldenCross,
        SummaryColumn::DeathCross,
        SummaryColumn::EarningsDate,
    ];

    fn header(self) -> &'static str {
        match self {
            SummaryColumn::Symbol => "Symbol",
            SummaryColumn::Company => "Company",
            SummaryColumn::Price => "Price",
            SummaryColumn::ChangePct => "Change %",
            SummaryColumn::Volume => "Volume (M)",
            SummaryColumn::AvgVolume => "Avg Volume (M)",
            SummaryColumn::MarketCap => "Market Cap (B)",
            SummaryColumn::Pe => "P/E",
            SummaryColumn::Eps => "EPS",
            SummaryColumn::Peg => "PEG",
            SummaryColumn::Pb => "P/B",
            SummaryColumn::Ma50 => "50-Day MA",
            SummaryColumn::Ma200 => "200-Day MA",
            SummaryColumn::GoldenCross => "Golden Cross",
            SummaryColumn::DeathCross => "Death Cross",
            SummaryColumn::EarningsDate => "Earnings Date",
        }
    }

    fn cell(self, s: &TickerSnapshot) -> String {
        let value = self.value(s);
        match self {
            SummaryColumn::Symbol => s.symbol.clone(),
            SummaryColumn::Company => s.company.clone(),
            SummaryColumn::Price | SummaryColumn::Ma50 | SummaryColumn::Ma200 => {
                format_price(value)
            }
            SummaryColumn::ChangePct => format_pct_change(value),
            SummaryColumn::Volume | SummaryColumn::AvgVolume => format_volume(value),
            SummaryColumn::MarketCap => match value {
                Some(v) => format!("${:.1}B", v / 1e9),
                None => NOT_AVAILABLE.to_string(),
            },
            SummaryColumn::Pe => format_ratio(value),
            SummaryColumn::Eps => match value {
                Some(v) => format!("${v:.2}"),
                None => NOT_AVAILABLE.to_string(),
            },
            SummaryColumn::Peg | SummaryColumn::Pb => match value {
                Some(v) => format!("{v:.2}"),
                None => NOT_AVAILABLE.to_string(),
            },
            SummaryColumn::GoldenCross => summary_cell(s.golden_cross.as_ref()),
            SummaryColumn::DeathCross => summary_cell(s.death_cross.as_ref()),
            SummaryColumn::EarningsDate => format_date(s.earnings.map(|e| e.day())),
        }
    }

    fn sort_key(self, s: &TickerSnapshot) -> SortKey<'_> {
        match self {
            SummaryColumn::Symbol => SortKey::Text(&s.symbol),
            SummaryColumn::Company => SortKey::Text(&s.company),
            SummaryColumn::EarningsDate => SortKey::Number(
                s.earnings
                    .map(|e| e.date.and_utc().timestamp() as f64),
            ),
            _ => SortKey::Number(self.value(s)),
        }
    }

    fn default_direction(self) -> SortDirection {
        match self {
            SummaryColumn::Symbol
            | SummaryColumn::Company
            | SummaryColumn::GoldenCross
            | SummaryColumn::DeathCross
            | SummaryColumn::EarningsDate => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }
}

pub const SUMMARY_LEGEND: &str = "🟢 = True/Present | 🔴 = False/Absent";

/// Counts shown under the summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MarketSummary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub golden_crosses: usize,
    pub death_crosses: usize,
}

impl MarketSummary {
    pub fn from_snapshots<'a>(snapshots: impl IntoIterator<Item = &'a TickerSnapshot>) -> Self {
        let mut summary = MarketSummary::default();
        for s in snapshots {
            summary.total += 1;
            if s.is_up() {
                summary.positive += 1;
            }
            if s.golden_cross.is_some() {
                summary.golden_crosses += 1;
            }
            if s.death_cross.is_some() {
                summary.death_crosses += 1;
            }
        }
        summary.negative = summary.total - summary.positive;
        summary
    }

    /// Share of positive tickers in percent; `None` for an empty poll.
    pub fn positive_pct(&self) -> Option<f64> {
        self.share(self.positive)
    }

    pub fn negative_pct(&self) -> Option<f64> {
        self.share(self.negative)
    }

    fn share(&self, n: usize) -> Option<f64> {
        (self.total > 0).then(|| n as f64 / self.total as f64 * 100.0)
    }
}

// ─── Cross tabs ──────────────────────────────────────────────────────

/// A ticker with a recent cross of one kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossRow {
    pub symbol: String,
    pub company: String,
    pub price: f64,
    pub pct_change: f64,
    pub event: CrossEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossColumn {
    Symbol,
    Company,
    Price,
    ChangePct,
    Signal,
    DaysAgo,
}

impl TableColumn for CrossColumn {
    type Row = CrossRow;

    const ALL: &'static [Self] = &[
        CrossColumn::Symbol,
        CrossColumn::Company,
        CrossColumn::Price,
        CrossColumn::ChangePct,
        CrossColumn::Signal,
        CrossColumn::DaysAgo,
    ];

    fn header(self) -> &'static str {
        match self {
            CrossColumn::Symbol => "Symbol",
            CrossColumn::Company => "Company",
            CrossColumn::Price => "Price",
            CrossColumn::ChangePct => "Change %",
            CrossColumn::Signal => "Signal",
            CrossColumn::DaysAgo => "Days Ago",
        }
    }

    fn cell(self, row: &CrossRow) -> String {
        match self {
            CrossColumn::Symbol => row.symbol.clone(),
            CrossColumn::Company => row.company.clone(),
            CrossColumn::Price => format_price(Some(row.price)),
            CrossColumn::ChangePct => format_pct_change(Some(row.pct_change)),
            CrossColumn::Signal => row.event.tab_cell(),
            CrossColumn::DaysAgo => row.event.days_ago.to_string(),
        }
    }

    fn sort_key(self, row: &CrossRow) -> SortKey<'_> {
        match self {
            CrossColumn::Symbol => SortKey::Text(&row.symbol),
            CrossColumn::Company => SortKey::Text(&row.company),
            CrossColumn::Price => SortKey::Number(Some(row.price)),
            CrossColumn::ChangePct => SortKey::Number(Some(row.pct_change)),
            CrossColumn::Signal | CrossColumn::DaysAgo => {
                SortKey::Number(Some(row.event.days_ago as f64))
            }
        }
    }
}

fn event_of(s: &TickerSnapshot, kind: CrossKind) -> Option<CrossEvent> {
    match kind {
        CrossKind::Golden => s.golden_cross,
        CrossKind::Death => s.death_cross,
    }
}

/// Tickers with a recent cross of `kind`, in display order.
pub fn cross_rows(outcome: &PollOutcome, kind: CrossKind) -> Vec<CrossRow> {
    outcome
        .tickers()
        .filter_map(|t| {
            let s = &t.snapshot;
            event_of(s, kind).map(|event| CrossRow {
                symbol: s.symbol.clone(),
                company: s.company.clone(),
                price: s.price,
                pct_change: s.pct_change,
                event,
            })
        })
        .collect()
}

/// Headline above a cross table.
pub fn cross_headline(kind: CrossKind, found: usize, lookback: usize) -> String {
    let name = kind.label().to_lowercase();
    if found > 0 {
        format!("Found {found} stocks with a {name} in the past {lookback} days")
    } else {
        format!("No stocks with a {name} in the past {lookback} days were found")
    }
}

/// Explanation shown under a cross tab.
pub fn cross_about(kind: CrossKind, lookback: usize) -> [String; 2] {
    let (name, direction, signal) = match kind {
        CrossKind::Golden => ("golden cross", "above", "bullish"),
        CrossKind::Death => ("death cross", "below", "bearish"),
    };
    [
        format!(
            "A {name} occurs when the 50-day moving average crosses {direction} the 200-day \
             moving average. This is often considered a {signal} signal by technical analysts."
        ),
        format!("The charts show stocks that have experienced a {name} in the past {lookback} days."),
    ]
}

/// Where the latest crossover on a chart happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrossPoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Close, fast MA and slow MA over the trailing [`CHART_BARS`] bars.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossChart {
    pub symbol: String,
    pub company: String,
    pub kind: CrossKind,
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    /// NaN during warmup.
    pub ma_fast: Vec<f64>,
    pub ma_slow: Vec<f64>,
    pub latest_cross: Option<CrossPoint>,
}

impl CrossChart {
    pub fn caption(&self) -> Option<String> {
        self.latest_cross.map(|p| {
            format!(
                "{} occurred on {} at price ${:.1}",
                self.kind.label(),
                p.date.format("%Y-%m-%d"),
                p.price
            )
        })
    }
}

/// Chart series for one ticker. Averages run over the full history so the
/// charted window has no warmup gap when enough bars were fetched.
pub fn cross_chart(ticker: &PolledTicker, kind: CrossKind, params: &CrossParams) -> CrossChart {
    let all_closes = closes(&ticker.bars);
    let fast = rolling_mean(&all_closes, params.fast_period);
    let slow = rolling_mean(&all_closes, params.slow_period);

    let start = ticker.bars.len().saturating_sub(CHART_BARS);
    let bars = &ticker.bars[start..];
    let fast = fast[start..].to_vec();
    let slow = slow[start..].to_vec();

    let latest_cross = crossover_points(&fast, &slow, kind)
        .last()
        .map(|&i| CrossPoint {
            date: bars[i].date,
            price: bars[i].close,
        });

    CrossChart {
        symbol: ticker.snapshot.symbol.clone(),
        company: ticker.snapshot.company.clone(),
        kind,
        dates: bars.iter().map(|b| b.date).collect(),
        close: all_closes[start..].to_vec(),
        ma_fast: fast,
        ma_slow: slow,
        latest_cross,
    }
}

/// Charts for every ticker in the cross table, in the same order.
pub fn cross_charts(outcome: &PollOutcome, kind: CrossKind, params: &CrossParams) -> Vec<CrossChart> {
    outcome
        .tickers()
        .filter(|t| event_of(&t.snapshot, kind).is_some())
        .map(|t| cross_chart(t, kind, params))
        .collect()
}

// ─── Volume tab ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeRow {
    pub symbol: String,
    pub company: String,
    pub price: f64,
    pub pct_change: f64,
    pub volume: f64,
    pub avg_volume: Option<f64>,
    pub ratio: Option<f64>,
}

impl VolumeRow {
    fn from_snapshot(s: &TickerSnapshot) -> Self {
        let volume = s.volume as f64;
        let avg_volume = s.avg_volume();
        Self {
            symbol: s.symbol.clone(),
            company: s.company.clone(),
            price: s.price,
            pct_change: s.pct_change,
            volume,
            avg_volume,
            ratio: volume_ratio(volume, avg_volume),
        }
    }

    /// `None` when there is no average to compare against.
    pub fn level(&self) -> Option<VolumeLevel> {
        self.ratio.map(VolumeLevel::from_ratio)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeColumn {
    Symbol,
    Company,
    Price,
    ChangePct,
    Volume,
    AvgVolume,
    Ratio,
}

impl TableColumn for VolumeColumn {
    type Row = VolumeRow;

    const ALL: &'static [Self] = &[
        VolumeColumn::Symbol,
        VolumeColumn::Company,
        VolumeColumn::Price,
        VolumeColumn::ChangePct,
        VolumeColumn::Volume,
        VolumeColumn::AvgVolume,
        VolumeColumn::Ratio,
    ];

    fn header(self) -> &'static str {
        match self {
            VolumeColumn::Symbol => "Symbol",
            VolumeColumn::Company => "Company",
            VolumeColumn::Price => "Price",
            VolumeColumn::ChangePct => "Change %",
            VolumeColumn::Volume => "Volume (M)",
            VolumeColumn::AvgVolume => "Avg Vol (M)",
            VolumeColumn::Ratio => "Vol/Avg Ratio",
        }
    }

    fn cell(self, row: &VolumeRow) -> String {
        match self {
            VolumeColumn::Symbol => row.symbol.clone(),
            VolumeColumn::Company => row.company.clone(),
            VolumeColumn::Price => format_price(Some(row.price)),
            VolumeColumn::ChangePct => format_pct_change(Some(row.pct_change)),
            VolumeColumn::Volume => format_volume(Some(row.volume)),
            VolumeColumn::AvgVolume => format_volume(row.avg_volume),
            VolumeColumn::Ratio => format_multiple(row.ratio),
        }
    }

    fn sort_key(self, row: &VolumeRow) -> SortKey<'_> {
        match self {
            VolumeColumn::Symbol => SortKey::Text(&row.symbol),
            VolumeColumn::Company => SortKey::Text(&row.company),
            VolumeColumn::Price => SortKey::Number(Some(row.price)),
            VolumeColumn::ChangePct => SortKey::Number(Some(row.pct_change)),
            VolumeColumn::Volume => SortKey::Number(Some(row.volume)),
            VolumeColumn::AvgVolume => SortKey::Number(row.avg_volume),
            VolumeColumn::Ratio => SortKey::Number(row.ratio),
        }
    }

    fn default_direction(self) -> SortDirection {
        match self {
            VolumeColumn::Symbol | VolumeColumn::Company => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }
}

pub fn volume_rows(outcome: &PollOutcome) -> Vec<VolumeRow> {
    outcome
        .tickers()
        .map(|t| VolumeRow::from_snapshot(&t.snapshot))
        .collect()
}

/// An earnings date placed on the bar closest to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EarningsMarker {
    pub date: NaiveDate,
    pub bar_index: usize,
    pub price: f64,
    pub volume_m: f64,
}

impl EarningsMarker {
    pub fn note(&self) -> String {
        format!(
            "• {}: ${:.1}, Vol: {:.1}M",
            self.date.format("%Y-%m-%d"),
            self.price,
            self.volume_m
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeChart {
    pub symbol: String,
    pub company: String,
    pub dates: Vec<NaiveDate>,
    pub volume_m: Vec<f64>,
    /// NaN during warmup.
    pub avg_volume_m: Vec<f64>,
    pub close: Vec<f64>,
    pub metrics: Option<VolumeMetrics>,
    pub weekly_change: Option<f64>,
    pub earnings: Vec<EarningsMarker>,
}

impl VolumeChart {
    pub fn alert_text(&self) -> Option<String> {
        let metrics = self.metrics?;
        let ratio = metrics.ratio?;
        Some(VolumeLevel::from_ratio(ratio).alert_text(&self.symbol, ratio))
    }

    pub fn weekly_text(&self) -> Option<String> {
        self.weekly_change.map(|pct| {
            format!(
                "Weekly average volume has {} compared to the previous week.",
                weekly_change_text(pct)
            )
        })
    }
}

pub fn volume_chart(ticker: &PolledTicker, fallbacks: &EarningsFallbacks) -> VolumeChart {
    let bars = &ticker.bars;
    let symbol = &ticker.snapshot.symbol;
    let dates = earnings_dates(symbol, &ticker.evidence, fallbacks);

    VolumeChart {
        symbol: symbol.clone(),
        company: ticker.snapshot.company.clone(),
        dates: bars.iter().map(|b| b.date).collect(),
        volume_m: bars.iter().map(|b| b.volume_f64() / 1e6).collect(),
        avg_volume_m: rolling_average_volume(bars, VOLUME_AVG_PERIOD)
            .into_iter()
            .map(|v| v / 1e6)
            .collect(),
        close: closes(bars),
        metrics: VolumeMetrics::from_bars(bars, VOLUME_AVG_PERIOD),
        weekly_change: weekly_volume_change(bars),
        earnings: earnings_markers(bars, &dates),
    }
}

/// Dates to mark: pinned dates when configured for the symbol, otherwise
/// every date the provider reported.
fn earnings_dates(
    symbol: &str,
    evidence: &EarningsEvidence,
    fallbacks: &EarningsFallbacks,
) -> Vec<NaiveDate> {
    let pinned = fallbacks.pinned_for(symbol);
    let mut dates: Vec<NaiveDate> = if pinned.is_empty() {
        evidence
            .history
            .iter()
            .chain(&evidence.listed_dates)
            .chain(&evidence.calendar_dates)
            .map(NaiveDateTime::date)
            .collect()
    } else {
        pinned.to_vec()
    };
    dates.sort();
    dates.dedup();
    dates
}

/// Markers for dates inside the bar range, each on its closest bar.
pub fn earnings_markers(bars: &[Bar], dates: &[NaiveDate]) -> Vec<EarningsMarker> {
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return Vec::new();
    };
    dates
        .iter()
        .filter(|d| **d >= first.date && **d <= last.date)
        .filter_map(|&date| {
            let (bar_index, bar) = bars
                .iter()
                .enumerate()
                .min_by_key(|(_, b)| (b.date - date).num_days().abs())?;
            Some(EarningsMarker {
                date,
                bar_index,
                price: bar.close,
                volume_m: bar.volume_f64() / 1e6,
            })
        })
        .collect()
}

// ─── Status ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarketStatus {
    Open,
    Closed,
}

impl MarketStatus {
    /// Simplified session: open from 09:00 until 16:00 local time.
    pub fn at(now: NaiveDateTime) -> Self {
        if (MARKET_OPEN_HOUR..MARKET_CLOSE_HOUR).contains(&now.hour()) {
            MarketStatus::Open
        } else {
            MarketStatus::Closed
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MarketStatus::Open => "🟢 Market Open",
            MarketStatus::Closed => "🔴 Market Closed",
        }
    }
}

pub fn last_updated_text(at: NaiveDateTime) -> String {
    format!("Last updated: {}", at.format("%H:%M:%S"))
}
