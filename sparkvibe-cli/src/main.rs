//! SparkVibe CLI — poll the watch-list once and print a dashboard table.
//!
//! Commands:
//! - `summary` — every ticker with price, valuation, moving averages and earnings
//! - `crosses --kind golden|death` — tickers with a recent moving-average cross
//! - `volume` — volume vs. average volume
//! - `cpi` — latest CPI by category with headline figures and insights
//! - `export --out FILE` — write the summary as CSV (or JSON for `.json`)
//! - `earnings SYMBOL` — resolve one ticker's earnings date and show every source

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use sparkvibe_core::cpi::availability_notice;
use sparkvibe_core::data::ConsoleProgress;
use sparkvibe_core::domain::AssetKind;
use sparkvibe_core::earnings::resolve_earnings;
use sparkvibe_core::indicators::{CrossKind, VolumeLevel};
use sparkvibe_runner::views::{cross_about, cross_headline, cross_rows, volume_rows};
use sparkvibe_runner::{
    build_provider, init_logging, load_cpi, poll_watchlist, save_summary, DashboardConfig,
    DataMode, ExportFormat, LogConfig, LogTarget, MarketStatus, MarketSummary, PollOptions,
    PollOutcome, SummaryColumn, TableColumn, TableSort,
};

#[derive(Parser)]
#[command(name = "sparkvibe", about = "SparkVibe CLI — stock and inflation dashboard")]
struct Cli {
    /// Path to a sparkvibe.toml config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use seeded mock data instead of the live providers.
    #[arg(long, global = true, default_value_t = false)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the summary table.
    Summary {
        /// Sort by this column header, e.g. "Price".
        #[arg(long)]
        sort: Option<String>,
    },
    /// Print tickers with a golden or death cross in the look-back window.
    Crosses {
        #[arg(long, value_enum, default_value_t = KindArg::Golden)]
        kind: KindArg,
    },
    /// Print volume vs. average volume for every ticker.
    Volume,
    /// Print the latest CPI figures by category.
    Cpi,
    /// Poll and write the summary table to a file.
    Export {
        /// Output file; `.json` writes JSON, anything else CSV.
        #[arg(long)]
        out: PathBuf,
    },
    /// Resolve the earnings date for one symbol.
    Earnings {
        symbol: String,

        /// Print the resolved date and evidence as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Golden,
    Death,
}

impl From<KindArg> for CrossKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Golden => CrossKind::Golden,
            KindArg::Death => CrossKind::Death,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env("warn", LogTarget::Stderr))?;

    let mut config = DashboardConfig::load(cli.config.as_deref())
        .context("failed to load dashboard config")?;
    if cli.mock {
        config.mode = DataMode::Mock;
    }
    tracing::debug!(mode = config.mode.label(), "config loaded");

    match cli.command {
        Commands::Summary { sort } => run_summary(&config, sort.as_deref()),
        Commands::Crosses { kind } => run_crosses(&config, kind.into()),
        Commands::Volume => run_volume(&config),
        Commands::Cpi => run_cpi(&config),
        Commands::Export { out } => run_export(&config, &out),
        Commands::Earnings { symbol, json } => run_earnings(&config, &symbol, json),
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// One serial poll of the configured watch-list, progress on stderr.
fn poll(config: &DashboardConfig) -> Result<PollOutcome> {
    let watchlist = config.load_watchlist()?;
    let now = now();
    let provider = build_provider(config, now)?;
    let outcome = poll_watchlist(
        provider.as_ref(),
        &watchlist,
        &PollOptions::from_config(config),
        now,
        &ConsoleProgress,
        None,
    );
    if outcome.stopped_early {
        eprintln!("Poll stopped early: {} is unavailable", provider.name());
    }
    Ok(outcome)
}

fn run_summary(config: &DashboardConfig, sort: Option<&str>) -> Result<()> {
    let outcome = poll(config)?;
    let mut rows = outcome.snapshots();

    let mut table_sort = TableSort::<SummaryColumn>::default();
    if let Some(header) = sort {
        let column = SummaryColumn::ALL
            .iter()
            .copied()
            .find(|c| c.header().eq_ignore_ascii_case(header))
            .with_context(|| format!("unknown column '{header}'"))?;
        while table_sort.column != Some(column) {
            table_sort.cycle();
        }
        table_sort.apply(&mut rows);
    }

    let summary = MarketSummary::from_snapshots(rows.iter().copied());
    println!(
        "{}  |  {}",
        MarketStatus::at(Local::now().naive_local()).label(),
        sparkvibe_runner::views::last_updated_text(Local::now().naive_local())
    );
    println!(
        "Total Stocks: {}   Positive: {}{}   Negative: {}{}   Golden Crosses: {}   Death Crosses: {}",
        summary.total,
        summary.positive,
        pct_suffix(summary.positive_pct()),
        summary.negative,
        pct_suffix(summary.negative_pct()),
        summary.golden_crosses,
        summary.death_crosses,
    );
    println!();
    print!("{}", render_table::<SummaryColumn>(&rows));
    println!();
    println!("{}", sparkvibe_runner::views::SUMMARY_LEGEND);
    if table_sort.column.is_some() {
        println!("Sorted by {}", table_sort.label());
    }
    Ok(())
}

fn run_crosses(config: &DashboardConfig, kind: CrossKind) -> Result<()> {
    let outcome = poll(config)?;
    let rows = cross_rows(&outcome, kind);
    let lookback = config.cross.lookback;

    println!("{}", cross_headline(kind, rows.len(), lookback));
    if !rows.is_empty() {
        println!();
        let refs: Vec<_> = rows.iter().collect();
        print!("{}", render_table::<sparkvibe_runner::CrossColumn>(&refs));
    }
    println!();
    for line in cross_about(kind, lookback) {
        println!("{line}");
    }
    Ok(())
}

fn run_volume(config: &DashboardConfig) -> Result<()> {
    let outcome = poll(config)?;
    let rows = volume_rows(&outcome);
    let refs: Vec<_> = rows.iter().collect();
    print!("{}", render_table::<sparkvibe_runner::VolumeColumn>(&refs));

    let high: Vec<&str> = rows
        .iter()
        .filter(|r| r.level() == Some(VolumeLevel::High))
        .map(|r| r.symbol.as_str())
        .collect();
    if !high.is_empty() {
        println!();
        println!("High volume: {}", high.join(", "));
    }
    Ok(())
}

fn run_cpi(config: &DashboardConfig) -> Result<()> {
    let today = Local::now().date_naive();
    let load = load_cpi(config, today);
    let dataset = &load.dataset;

    println!("{}", availability_notice(today));
    match &load.warning {
        Some(warning) => eprintln!("WARN: {warning}"),
        None => println!("{}", load.source_text()),
    }
    println!();

    for metric in dataset.headline_metrics() {
        let rate = metric
            .rate
            .map(|r| format!("{r:.1}%"))
            .unwrap_or_else(|| "N/A".to_string());
        println!("{:<14} {:>6}  {}", metric.label, rate, metric.delta_text());
    }
    println!();

    if let Some(month) = dataset.latest_month() {
        println!("CPI by Category - {}", month.format("%B %Y"));
    }
    println!("{:<36} {:>11}  Status", "Category", "Annual Rate");
    println!("{}", "-".repeat(64));
    for o in dataset.latest_rows() {
        let status = sparkvibe_core::cpi::InflationStatus::from_rate(o.rate);
        println!(
            "{:<36} {:>10.1}%  {} {}",
            o.category,
            o.rate,
            status.light(),
            status.label()
        );
    }

    if let Some(insights) = dataset.insights() {
        println!();
        println!("Key Insights");
        for line in insights.lines() {
            println!("  • {line}");
        }
    }
    Ok(())
}

fn run_export(config: &DashboardConfig, out: &Path) -> Result<()> {
    let outcome = poll(config)?;
    let rows = outcome.snapshots();
    let format = ExportFormat::from_path(out);
    save_summary(&rows, out, format)?;
    println!("Exported {} tickers to {}", rows.len(), out.display());
    Ok(())
}

fn run_earnings(config: &DashboardConfig, symbol: &str, json: bool) -> Result<()> {
    let symbol = symbol.to_ascii_uppercase();
    let watchlist = config.load_watchlist()?;
    let kind = watchlist
        .get(&symbol)
        .map(|e| e.kind)
        .unwrap_or(AssetKind::Equity);

    let now = now();
    let provider = build_provider(config, now)?;
    let evidence = provider
        .earnings_evidence(&symbol)
        .with_context(|| format!("failed to fetch earnings data for {symbol}"))?;
    let resolved = resolve_earnings(&symbol, kind, &evidence, &config.earnings, now);

    if json {
        let value = serde_json::json!({
            "symbol": symbol,
            "kind": kind.label(),
            "resolved": resolved,
            "evidence": evidence,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{symbol} ({})", kind.label());
    print_dates("Listed dates", &evidence.listed_dates);
    print_dates("Calendar", &evidence.calendar_dates);
    print_dates("History", &evidence.history);
    print_dates("Next timestamp", evidence.next_timestamp.as_slice());
    println!();
    match resolved {
        Some(r) => println!(
            "Earnings: {} ({}, from {})",
            r.day(),
            r.status.label(),
            r.source.label()
        ),
        None if !kind.has_earnings() => println!("Earnings: N/A ({} has no earnings)", kind.label()),
        None => println!("Earnings: N/A (no source available)"),
    }
    Ok(())
}

fn print_dates(label: &str, dates: &[NaiveDateTime]) {
    let text = if dates.is_empty() {
        "-".to_string()
    } else {
        dates
            .iter()
            .map(|d| d.date().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("  {label:<16} {text}");
}

fn pct_suffix(pct: Option<f64>) -> String {
    pct.map(|p| format!(" ({p:.1}%)")).unwrap_or_default()
}

/// Plain-text table with every column padded to its widest cell.
fn render_table<C: TableColumn>(rows: &[&C::Row]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| C::ALL.iter().map(|c| c.cell(row)).collect())
        .collect();
    let widths: Vec<usize> = C::ALL
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.header().chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = C::ALL
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c.header(), w = *w))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    out.push('\n');
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| {
                let pad = w.saturating_sub(cell.chars().count());
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn mock_config() -> DashboardConfig {
        DashboardConfig {
            mode: DataMode::Mock,
            mock_seed: Some(7),
            request_delay_ms: Some(0),
            ..DashboardConfig::default()
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sparkvibe", "crosses", "--kind", "death", "--mock"]).unwrap();
        assert!(cli.mock);
        assert!(matches!(
            cli.command,
            Commands::Crosses {
                kind: KindArg::Death
            }
        ));
    }

    #[test]
    fn export_requires_out() {
        assert!(Cli::try_parse_from(["sparkvibe", "export"]).is_err());
    }

    #[test]
    fn table_columns_are_aligned() {
        let outcome = poll(&mock_config()).unwrap();
        let rows = volume_rows(&outcome);
        let refs: Vec<_> = rows.iter().collect();
        let text = render_table::<sparkvibe_runner::VolumeColumn>(&refs);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), rows.len() + 2);
        assert!(lines[0].starts_with("Symbol"));
        assert!(lines[1].chars().all(|c| c == '-'));
    }

    #[test]
    fn export_writes_csv_in_mock_mode() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("summary.csv");
        run_export(&mock_config(), &out).unwrap();
        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.lines().count() > 1);
        assert!(content.contains("SPY"));
    }
}
