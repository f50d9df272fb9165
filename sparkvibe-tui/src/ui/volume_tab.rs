//! Tab 4 — Volume Analysis: volume vs. average for every ticker, and the
//! volume/price charts with earnings markers for the selected one.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap};
use ratatui::Frame;

use sparkvibe_core::format::{format_multiple, format_volume};
use sparkvibe_core::indicators::VolumeLevel;
use sparkvibe_runner::views::{volume_chart, VolumeChart};
use sparkvibe_runner::VolumeColumn;

use crate::app::{sorted, AppState};
use crate::theme;
use crate::ui::widgets;

const WIDTHS: [Constraint; 7] = [
    Constraint::Length(8),
    Constraint::Length(28),
    Constraint::Length(10),
    Constraint::Length(9),
    Constraint::Length(11),
    Constraint::Length(12),
    Constraint::Length(14),
];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(outcome) = &app.outcome else {
        widgets::render_placeholder(f, area, &["No market data yet. Press r to refresh."]);
        return;
    };

    let rows = app.volume_rows();
    let ordered = sorted(&rows, &app.volume.sort);
    let table_height = (ordered.len() as u16 + 1).clamp(2, 12);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(table_height), Constraint::Min(10)])
        .split(area);

    widgets::render_table(
        f,
        chunks[0],
        &ordered,
        &app.volume,
        &WIDTHS,
        |c, row| match c {
            VolumeColumn::ChangePct => theme::change(row.pct_change),
            VolumeColumn::Symbol => theme::accent(),
            VolumeColumn::Ratio => match row.level() {
                Some(level) => Style::default().fg(theme::palette().volume_color(level)),
                None => theme::muted(),
            },
            _ => theme::text(),
        },
    );

    let selected = ordered
        .get(app.volume.cursor.min(ordered.len().saturating_sub(1)))
        .and_then(|row| outcome.get(&row.symbol));
    let Some(ticker) = selected else {
        widgets::render_placeholder(f, chunks[1], &["No volume data to display."]);
        return;
    };
    let chart = volume_chart(ticker, &app.config.earnings);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(chunks[1]);
    let charts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body[0]);

    render_volume_chart(f, charts[0], &chart);
    render_price_chart(f, charts[1], &chart);
    f.render_widget(
        Paragraph::new(detail_lines(&chart)).wrap(Wrap { trim: true }),
        body[1],
    );
}

fn render_volume_chart(f: &mut Frame, area: Rect, chart: &VolumeChart) {
    let palette = theme::palette();
    let volume = widgets::series_points(&chart.volume_m);
    let average = widgets::series_points(&chart.avg_volume_m);

    let Some([_, top]) =
        widgets::y_bounds(&[chart.volume_m.as_slice(), chart.avg_volume_m.as_slice()])
    else {
        widgets::render_placeholder(f, area, &["No volume history for this ticker."]);
        return;
    };
    let bounds = [0.0, top];

    let datasets = vec![
        Dataset::default()
            .name("Volume (M)")
            .marker(symbols::Marker::HalfBlock)
            .graph_type(GraphType::Bar)
            .style(Style::default().fg(palette.muted))
            .data(&volume),
        Dataset::default()
            .name("30-Day Avg Volume")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(palette.warning))
            .data(&average),
    ];

    let widget = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(theme::muted())
                .title(format!(" {} ({}) - Volume Analysis ", chart.company, chart.symbol))
                .title_style(theme::accent_bold()),
        )
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([0.0, chart.volume_m.len().saturating_sub(1).max(1) as f64]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Volume (M)", theme::muted()))
                .style(theme::muted())
                .bounds(bounds)
                .labels(widgets::value_labels(bounds, |v| format!("{v:.1}"))),
        );
    f.render_widget(widget, area);
}

fn render_price_chart(f: &mut Frame, area: Rect, chart: &VolumeChart) {
    let palette = theme::palette();
    let close = widgets::series_points(&chart.close);
    let markers: Vec<(f64, f64)> = chart
        .earnings
        .iter()
        .map(|m| (m.bar_index as f64, m.price))
        .collect();

    let Some(bounds) = widgets::y_bounds(&[chart.close.as_slice()]) else {
        return;
    };

    let mut datasets = vec![Dataset::default()
        .name("Stock Price")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(palette.accent))
        .data(&close)];
    if !markers.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Earnings Date")
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(palette.negative))
                .data(&markers),
        );
    }

    let widget = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([0.0, chart.close.len().saturating_sub(1).max(1) as f64])
                .labels(widgets::date_labels(&chart.dates)),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Price ($)", theme::muted()))
                .style(theme::muted())
                .bounds(bounds)
                .labels(widgets::value_labels(bounds, |v| format!("{v:.0}"))),
        );
    f.render_widget(widget, area);
}

/// Metrics, alert, weekly trend and earnings notes beside the charts.
fn detail_lines(chart: &VolumeChart) -> Vec<Line<'static>> {
    let palette = theme::palette();
    let mut lines = vec![Line::from(Span::styled(
        "Volume Metrics",
        theme::accent_bold(),
    ))];

    match chart.metrics {
        Some(m) => {
            lines.push(metric_line(
                "Latest Volume",
                format_volume(Some(m.latest_volume)),
                theme::text(),
            ));
            lines.push(metric_line(
                "30-Day Avg Volume",
                format_volume(m.average_volume),
                theme::text(),
            ));
            let ratio_style = m
                .level()
                .map(|l| Style::default().fg(palette.volume_color(l)))
                .unwrap_or_else(theme::muted);
            lines.push(metric_line(
                "Volume Ratio",
                format_multiple(m.ratio),
                ratio_style,
            ));
        }
        None => lines.push(Line::from(Span::styled(
            "Not enough history for volume metrics.",
            theme::muted(),
        ))),
    }
    lines.push(Line::from(""));

    if let Some(alert) = chart.alert_text() {
        let style = match chart.metrics.and_then(|m| m.level()) {
            Some(VolumeLevel::High) => theme::warning(),
            _ => theme::secondary(),
        };
        lines.push(Line::from(Span::styled(alert, style)));
        lines.push(Line::from(""));
    }

    if let Some(weekly) = chart.weekly_text() {
        lines.push(Line::from(Span::styled(weekly, theme::secondary())));
        lines.push(Line::from(""));
    }

    if !chart.earnings.is_empty() {
        lines.push(Line::from(Span::styled("Earnings Dates", theme::accent_bold())));
        lines.extend(
            chart
                .earnings
                .iter()
                .map(|m| Line::from(Span::styled(m.note(), theme::negative()))),
        );
    }
    lines
}

fn metric_line(label: &str, value: String, style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:>18}: "), theme::muted()),
        Span::styled(value, style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sparkvibe_core::indicators::VolumeMetrics;
    use sparkvibe_runner::views::EarningsMarker;

    fn chart(metrics: Option<VolumeMetrics>) -> VolumeChart {
        let date = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        VolumeChart {
            symbol: "NVDA".into(),
            company: "NVIDIA Corporation".into(),
            dates: vec![date],
            volume_m: vec![4.5],
            avg_volume_m: vec![f64::NAN],
            close: vec![13.0],
            metrics,
            weekly_change: Some(12.5),
            earnings: vec![EarningsMarker {
                date,
                bar_index: 0,
                price: 13.0,
                volume_m: 4.5,
            }],
        }
    }

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn details_include_alert_weekly_and_earnings() {
        let metrics = VolumeMetrics {
            latest_volume: 90_000_000.0,
            average_volume: Some(30_000_000.0),
            ratio: Some(3.0),
        };
        let out = text(&detail_lines(&chart(Some(metrics))));
        assert!(out.contains("Volume Ratio: 3.0x"));
        assert!(out.contains("High Volume Alert: NVDA"));
        assert!(out.contains("Weekly average volume has"));
        assert!(out.contains("• 2024-01-04: $13.0, Vol: 4.5M"));
    }

    #[test]
    fn details_without_metrics() {
        let out = text(&detail_lines(&chart(None)));
        assert!(out.contains("Not enough history"));
        assert!(!out.contains("Alert"));
    }
}
