//! Consumer Price Index data: categories, observations and the inflation views.
//!
//! Observations are 12-month percent changes per category and month. They
//! come from the BLS API ([`crate::data::BlsClient`]) or from
//! [`generate_synthetic`], which follows recent real-world trends.

use chrono::{Datelike, Months, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inflation target drawn as a reference line.
pub const TARGET_RATE: f64 = 2.0;

/// Deflation threshold reference line.
pub const DEFLATION_THRESHOLD: f64 = 0.0;

/// Months of history shown in the trend chart.
pub const HISTORY_MONTHS: u32 = 24;

/// Publication delay of the BLS release.
pub const RELEASE_LAG_MONTHS: u32 = 2;

/// Live data is used only when at least this many categories came back.
pub const MIN_LIVE_CATEGORIES: usize = 3;

/// Categories pre-selected in the trend chart.
pub const DEFAULT_CHART_CATEGORIES: [&str; 5] = [
    "All Items",
    "Core CPI (ex Food & Energy)",
    "Food",
    "Energy",
    "Housing",
];

#[derive(Debug, Error)]
pub enum CpiError {
    #[error("BLS request failed: {0}")]
    Network(String),

    #[error("BLS returned HTTP {0}")]
    Http(u16),

    #[error("BLS request not processed: {0}")]
    Rejected(String),

    #[error("unexpected BLS response: {0}")]
    Format(String),
}

/// How a category's rate moved towards its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Declining,
    Increasing,
    Stable,
    Volatile,
}

/// A CPI category with its BLS series and the synthetic generator's profile.
#[derive(Debug, Clone, Copy)]
pub struct CpiCategory {
    pub name: &'static str,
    pub series_id: &'static str,
    pub current: f64,
    pub trend: Trend,
    pub volatility: f64,
}

impl CpiCategory {
    /// Clamp range for synthetic rates.
    pub fn bounds(&self) -> (f64, f64) {
        match self.name {
            "Energy" | "Gasoline" => (-20.0, 25.0),
            "Used Vehicles" => (-15.0, 15.0),
            _ => (-5.0, 10.0),
        }
    }
}

const fn category(
    name: &'static str,
    series_id: &'static str,
    current: f64,
    trend: Trend,
    volatility: f64,
) -> CpiCategory {
    CpiCategory {
        name,
        series_id,
        current,
        trend,
        volatility,
    }
}

pub const CATEGORIES: [CpiCategory; 14] = [
    category("All Items", "CUUR0000SA0", 3.2, Trend::Declining, 0.3),
    category("Core CPI (ex Food & Energy)", "CUUR0000SA0L1E", 3.8, Trend::Stable, 0.2),
    category("Food", "CUUR0000SAF1", 2.4, Trend::Declining, 0.8),
    category("Energy", "CUUR0000SA0E", -2.1, Trend::Volatile, 3.0),
    category("Housing", "CUUR0000SAH1", 5.4, Trend::Declining, 0.4),
    category("Transportation", "CUUR0000SAT1", 1.9, Trend::Stable, 1.2),
    category("Medical Care", "CUUR0000SAM", 3.1, Trend::Stable, 0.5),
    category("Recreation", "CUUR0000SAR", 1.8, Trend::Stable, 0.4),
    category("Education", "CUUR0000SAE1", 4.2, Trend::Increasing, 0.3),
    category("Apparel", "CUUR0000SAA", 0.8, Trend::Volatile, 1.5),
    category("Shelter", "CUUR0000SEHA", 5.7, Trend::Declining, 0.3),
    category("Used Vehicles", "CUUR0000SETA02", -2.8, Trend::Declining, 2.5),
    category("New Vehicles", "CUUR0000SETA01", 1.2, Trend::Stable, 0.8),
    category("Gasoline", "CUUR0000SETB01", -3.5, Trend::Volatile, 4.0),
];

pub fn category_for_series(series_id: &str) -> Option<&'static CpiCategory> {
    CATEGORIES.iter().find(|c| c.series_id == series_id)
}

/// One month's 12-month percent change for a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpiObservation {
    /// First day of the month.
    pub month: NaiveDate,
    pub category: String,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpiSource {
    /// BLS data covering this many categories.
    Live { categories: usize },
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflationStatus {
    Deflation,
    Low,
    Moderate,
    High,
}

impl InflationStatus {
    pub fn from_rate(rate: f64) -> Self {
        if rate < 0.0 {
            InflationStatus::Deflation
        } else if rate < 2.0 {
            InflationStatus::Low
        } else if rate < 4.0 {
            InflationStatus::Moderate
        } else {
            InflationStatus::High
        }
    }

    pub fn light(self) -> &'static str {
        match self {
            InflationStatus::Deflation => "🟢",
            InflationStatus::Low => "🟡",
            InflationStatus::Moderate => "🟠",
            InflationStatus::High => "🔴",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InflationStatus::Deflation => "Deflation (< 0%)",
            InflationStatus::Low => "Low (0-2%)",
            InflationStatus::Moderate => "Moderate (2-4%)",
            InflationStatus::High => "High (> 4%)",
        }
    }
}

/// Headline metric card: the latest rate and its month-over-month change.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlineMetric {
    pub label: &'static str,
    pub category: &'static str,
    pub rate: Option<f64>,
    pub delta: Option<f64>,
}

impl HeadlineMetric {
    pub fn delta_text(&self) -> String {
        match self.delta {
            Some(d) => format!("{d:+.1}% vs last month"),
            None => "N/A".to_string(),
        }
    }
}

const HEADLINES: [(&str, &str); 4] = [
    ("All Items CPI", "All Items"),
    ("Core CPI", "Core CPI (ex Food & Energy)"),
    ("Food", "Food"),
    ("Energy", "Energy"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct CpiInsights {
    pub highest: CpiObservation,
    pub lowest: CpiObservation,
    pub above_target: usize,
    pub deflation: usize,
    pub total: usize,
}

impl CpiInsights {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "Highest Inflation: {} at {:.1}%",
                self.highest.category, self.highest.rate
            ),
            format!(
                "Lowest Inflation: {} at {:.1}%",
                self.lowest.category, self.lowest.rate
            ),
            format!(
                "Categories Above 2% Target: {} out of {}",
                self.above_target, self.total
            ),
        ];
        if self.deflation > 0 {
            lines.push(format!(
                "Deflation Alert: {} categories showing deflation",
                self.deflation
            ));
        } else {
            lines.push("No Deflation: All categories showing positive inflation".to_string());
        }
        lines
    }
}

/// All observations from one load, with where they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpiDataset {
    pub observations: Vec<CpiObservation>,
    pub source: CpiSource,
}

impl CpiDataset {
    pub fn new(mut observations: Vec<CpiObservation>, source: CpiSource) -> Self {
        observations.sort_by(|a, b| a.month.cmp(&b.month).then(a.category.cmp(&b.category)));
        Self {
            observations,
            source,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn latest_month(&self) -> Option<NaiveDate> {
        self.observations.iter().map(|o| o.month).max()
    }

    /// Category names in table order.
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for cat in CATEGORIES.iter().map(|c| c.name) {
            if self.observations.iter().any(|o| o.category == cat) {
                names.push(cat);
            }
        }
        for o in &self.observations {
            if !names.contains(&o.category.as_str()) {
                names.push(&o.category);
            }
        }
        names
    }

    pub fn rate(&self, category: &str, month: NaiveDate) -> Option<f64> {
        self.observations
            .iter()
            .find(|o| o.category == category && o.month == month)
            .map(|o| o.rate)
    }

    /// Latest month's rows, highest rate first.
    pub fn latest_rows(&self) -> Vec<&CpiObservation> {
        let Some(latest) = self.latest_month() else {
            return Vec::new();
        };
        let mut rows: Vec<&CpiObservation> = self
            .observations
            .iter()
            .filter(|o| o.month == latest)
            .collect();
        rows.sort_by(|a, b| b.rate.total_cmp(&a.rate));
        rows
    }

    /// The `n` highest categories of the latest month.
    pub fn top(&self, n: usize) -> Vec<&CpiObservation> {
        let mut rows = self.latest_rows();
        rows.truncate(n);
        rows
    }

    /// All Items, Core, Food and Energy with their change since the prior month.
    pub fn headline_metrics(&self) -> Vec<HeadlineMetric> {
        let latest = self.latest_month();
        let prior = latest.and_then(|m| m.checked_sub_months(Months::new(1)));
        HEADLINES
            .iter()
            .map(|&(label, category)| {
                let rate = latest.and_then(|m| self.rate(category, m));
                let previous = prior.and_then(|m| self.rate(category, m));
                HeadlineMetric {
                    label,
                    category,
                    rate,
                    delta: rate
                        .zip(previous)
                        .map(|(r, p)| round1(r - p)),
                }
            })
            .collect()
    }

    pub fn insights(&self) -> Option<CpiInsights> {
        let rows = self.latest_rows();
        let highest = (*rows.first()?).clone();
        let lowest = (*rows.last()?).clone();
        Some(CpiInsights {
            highest,
            lowest,
            above_target: rows.iter().filter(|o| o.rate > TARGET_RATE).count(),
            deflation: rows.iter().filter(|o| o.rate < DEFLATION_THRESHOLD).count(),
            total: rows.len(),
        })
    }

    /// Chronological (month, rate) points for one category.
    pub fn series(&self, category: &str) -> Vec<(NaiveDate, f64)> {
        self.observations
            .iter()
            .filter(|o| o.category == category)
            .map(|o| (o.month, o.rate))
            .collect()
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Most recent month the BLS has published as of `today`.
pub fn latest_available_month(today: NaiveDate) -> NaiveDate {
    let start = first_of_month(today);
    start
        .checked_sub_months(Months::new(RELEASE_LAG_MONTHS))
        .unwrap_or(start)
}

pub fn availability_notice(today: NaiveDate) -> String {
    format!(
        "CPI data is released by the Bureau of Labor Statistics with approximately a \
         2-month delay. The most recent data available is for {}.",
        latest_available_month(today).format("%B %Y")
    )
}

/// 24 months of realistic rates ending at the latest available month.
///
/// Each category drifts towards its current rate according to its trend, with
/// noise bounded by its volatility; the final month is exactly the current rate.
pub fn generate_synthetic<R: Rng>(today: NaiveDate, rng: &mut R) -> CpiDataset {
    let latest = latest_available_month(today);
    let months: Vec<NaiveDate> = (0..HISTORY_MONTHS)
        .rev()
        .filter_map(|back| latest.checked_sub_months(Months::new(back)))
        .collect();

    let mut observations = Vec::with_capacity(months.len() * CATEGORIES.len());
    for cat in &CATEGORIES {
        let (lo, hi) = cat.bounds();
        for (i, &month) in months.iter().enumerate() {
            let months_back = (months.len() - 1 - i) as f64;
            let rate = if months_back == 0.0 {
                cat.current
            } else {
                let adjustment = match cat.trend {
                    Trend::Declining => months_back * 0.1,
                    Trend::Increasing => -months_back * 0.1,
                    Trend::Volatile => rng.gen_range(-1.0..=1.0),
                    Trend::Stable => rng.gen_range(-0.3..=0.3),
                };
                let noise = rng.gen_range(-cat.volatility..=cat.volatility);
                (cat.current + adjustment + noise).clamp(lo, hi)
            };
            observations.push(CpiObservation {
                month,
                category: cat.name.to_string(),
                rate: round1(rate),
            });
        }
    }
    CpiDataset::new(observations, CpiSource::Synthetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(month: NaiveDate, category: &str, rate: f64) -> CpiObservation {
        CpiObservation {
            month,
            category: category.to_string(),
            rate,
        }
    }

    #[test]
    fn status_buckets() {
        assert_eq!(InflationStatus::from_rate(-0.1), InflationStatus::Deflation);
        assert_eq!(InflationStatus::from_rate(0.0), InflationStatus::Low);
        assert_eq!(InflationStatus::from_rate(1.9), InflationStatus::Low);
        assert_eq!(InflationStatus::from_rate(2.0), InflationStatus::Moderate);
        assert_eq!(InflationStatus::from_rate(3.9), InflationStatus::Moderate);
        assert_eq!(InflationStatus::from_rate(4.0), InflationStatus::High);
    }

    #[test]
    fn latest_month_lags_two_months() {
        assert_eq!(latest_available_month(date(2024, 9, 17)), date(2024, 7, 1));
        assert_eq!(latest_available_month(date(2024, 2, 3)), date(2023, 12, 1));
        assert!(availability_notice(date(2024, 1, 31)).ends_with("November 2023."));
    }

    #[test]
    fn series_lookup() {
        assert_eq!(category_for_series("CUUR0000SETB01").unwrap().name, "Gasoline");
        assert!(category_for_series("CUUR0000XXXX").is_none());
    }

    #[test]
    fn synthetic_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        let ds = generate_synthetic(date(2024, 9, 17), &mut rng);
        assert_eq!(ds.source, CpiSource::Synthetic);
        assert_eq!(ds.observations.len(), 24 * CATEGORIES.len());
        assert_eq!(ds.latest_month(), Some(date(2024, 7, 1)));
        assert_eq!(ds.series("Energy").first().map(|p| p.0), Some(date(2022, 8, 1)));
        assert_eq!(ds.rate("Gasoline", date(2024, 7, 1)), Some(-3.5));
        for o in &ds.observations {
            let (lo, hi) = CATEGORIES
                .iter()
                .find(|c| c.name == o.category)
                .unwrap()
                .bounds();
            assert!(o.rate >= lo && o.rate <= hi, "{o:?}");
        }
    }

    #[test]
    fn latest_rows_sorted_descending() {
        let mut rng = StdRng::seed_from_u64(1);
        let ds = generate_synthetic(date(2024, 9, 17), &mut rng);
        let rows = ds.latest_rows();
        assert_eq!(rows.len(), CATEGORIES.len());
        assert_eq!(rows[0].category, "Shelter");
        assert_eq!(rows.last().unwrap().category, "Gasoline");
        assert!(rows.windows(2).all(|w| w[0].rate >= w[1].rate));
        assert_eq!(ds.top(10).len(), 10);
    }

    #[test]
    fn headline_delta_is_month_over_month() {
        let jun = date(2024, 6, 1);
        let jul = date(2024, 7, 1);
        let ds = CpiDataset::new(
            vec![
                obs(jun, "All Items", 3.0),
                obs(jul, "All Items", 3.2),
                obs(jul, "Food", 2.4),
            ],
            CpiSource::Live { categories: 2 },
        );
        let metrics = ds.headline_metrics();
        assert_eq!(metrics.len(), 4);
        assert_eq!(metrics[0].rate, Some(3.2));
        assert_eq!(metrics[0].delta, Some(0.2));
        assert_eq!(metrics[0].delta_text(), "+0.2% vs last month");
        assert_eq!(metrics[2].rate, Some(2.4));
        assert_eq!(metrics[2].delta, None);
        assert_eq!(metrics[3].rate, None);
    }

    #[test]
    fn insights_count_target_and_deflation() {
        let jul = date(2024, 7, 1);
        let ds = CpiDataset::new(
            vec![
                obs(jul, "Shelter", 5.7),
                obs(jul, "Food", 2.0),
                obs(jul, "Energy", -2.1),
                obs(jul, "Apparel", 0.8),
            ],
            CpiSource::Synthetic,
        );
        let insights = ds.insights().unwrap();
        assert_eq!(insights.highest.category, "Shelter");
        assert_eq!(insights.lowest.category, "Energy");
        assert_eq!(insights.above_target, 1);
        assert_eq!(insights.deflation, 1);
        assert_eq!(
            insights.lines()[3],
            "Deflation Alert: 1 categories showing deflation"
        );
    }

    #[test]
    fn empty_dataset_has_no_insights() {
        let ds = CpiDataset::new(Vec::new(), CpiSource::Synthetic);
        assert!(ds.insights().is_none());
        assert!(ds.latest_rows().is_empty());
    }
}
