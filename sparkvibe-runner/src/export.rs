//! Export of the summary table.
//!
//! - **CSV**: one row per ticker with raw numeric values; missing values are
//!   empty cells. Volume is in shares and market cap in dollars, not the
//!   scaled units the table displays.
//! - **JSON**: the full snapshots, pretty-printed.

use std::path::Path;

use anyhow::{Context, Result};
use sparkvibe_core::domain::TickerSnapshot;

use crate::views::{SummaryColumn, TableColumn};

const STATUS_HEADER: &str = "Earnings Status";

/// Raw CSV cell for one summary column.
fn raw_cell(column: SummaryColumn, s: &TickerSnapshot) -> String {
    match column {
        SummaryColumn::Symbol => s.symbol.clone(),
        SummaryColumn::Company => s.company.clone(),
        SummaryColumn::EarningsDate => s
            .earnings
            .map(|e| e.day().format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        SummaryColumn::Volume => s.volume.to_string(),
        other => other.value(s).map(|v| v.to_string()).unwrap_or_default(),
    }
}

/// The summary table as CSV, rows in the given order.
pub fn export_summary_csv(snapshots: &[&TickerSnapshot]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<&str> = SummaryColumn::ALL.iter().map(|c| c.header()).collect();
    header.push(STATUS_HEADER);
    wtr.write_record(&header)?;

    for s in snapshots {
        let mut record: Vec<String> = SummaryColumn::ALL
            .iter()
            .map(|&c| raw_cell(c, s))
            .collect();
        record.push(
            s.earnings
                .map(|e| e.status.label().to_string())
                .unwrap_or_default(),
        );
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush summary CSV")?;
    String::from_utf8(data).context("summary CSV is not UTF-8")
}

pub fn export_snapshots_json(snapshots: &[&TickerSnapshot]) -> Result<String> {
    serde_json::to_string_pretty(snapshots).context("failed to serialize snapshots to JSON")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// Picks JSON for a `.json` extension, CSV otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

/// Write the export to `path`, creating parent directories.
pub fn save_summary(snapshots: &[&TickerSnapshot], path: &Path, format: ExportFormat) -> Result<()> {
    let content = match format {
        ExportFormat::Csv => export_summary_csv(snapshots)?,
        ExportFormat::Json => export_snapshots_json(snapshots)?,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write export {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = snapshots.len(), "summary exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sparkvibe_core::domain::Fundamentals;
    use sparkvibe_core::earnings::{EarningsSource, EarningsStatus, ResolvedEarnings};
    use sparkvibe_core::indicators::{CrossEvent, CrossKind};

    fn sample() -> TickerSnapshot {
        let now = NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        TickerSnapshot {
            symbol: "MSFT".into(),
            company: "Microsoft Corporation".into(),
            price: 412.5,
            open: 410.0,
            high: 415.0,
            low: 409.0,
            volume: 21_000_000,
            previous_close: 410.0,
            daily_change: 2.5,
            pct_change: 0.5,
            fundamentals: Fundamentals {
                market_cap: Some(3.0e12),
                trailing_pe: Some(35.5),
                ..Fundamentals::default()
            },
            ma_50: Some(405.25),
            ma_200: None,
            golden_cross: Some(CrossEvent {
                kind: CrossKind::Golden,
                days_ago: 4,
            }),
            death_cross: None,
            earnings: Some(ResolvedEarnings {
                date: NaiveDate::from_ymd_opt(2024, 7, 23)
                    .unwrap()
                    .and_hms_opt(20, 0, 0)
                    .unwrap(),
                status: EarningsStatus::Upcoming,
                source: EarningsSource::Calendar,
            }),
            fetched_at: now,
        }
    }

    #[test]
    fn csv_has_all_columns_and_raw_values() {
        let s = sample();
        let csv = export_summary_csv(&[&s]).unwrap();
        let mut lines = csv.lines();

        let header: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(header.len(), 17);
        assert_eq!(header[0], "Symbol");
        assert_eq!(header[15], "Earnings Date");
        assert_eq!(header[16], "Earnings Status");

        let row = lines.next().unwrap();
        assert!(row.starts_with("MSFT,Microsoft Corporation,412.5,0.5,21000000,,3000000000000,35.5,"));
        assert!(row.ends_with(",405.25,,4,,2024-07-23,upcoming"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn json_export_is_an_array() {
        let s = sample();
        let json = export_snapshots_json(&[&s]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["symbol"], "MSFT");
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("out/a.JSON")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("a.csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("summary")), ExportFormat::Csv);
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("summary.csv");
        let s = sample();
        save_summary(&[&s], &path, ExportFormat::Csv).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Symbol,Company,"));
    }
}
