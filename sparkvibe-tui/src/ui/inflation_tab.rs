//! Tab 5 — Inflation (CPI): headline cards, the latest month by category,
//! top-10 bar chart, trend chart of the selected categories and insights.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph,
    Row, Table, TableState, Wrap,
};
use ratatui::Frame;

use sparkvibe_core::cpi::{
    availability_notice, CpiDataset, HeadlineMetric, InflationStatus, DEFLATION_THRESHOLD,
    TARGET_RATE,
};
use sparkvibe_runner::CpiLoad;

use crate::app::AppState;
use crate::theme;
use crate::ui::widgets;

const TOP_CATEGORIES: usize = 10;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(load) = &app.cpi else {
        let message = if app.cpi_in_flight {
            "Loading CPI data..."
        } else {
            "No CPI data. Press r to refresh."
        };
        widgets::render_placeholder(f, area, &[message]);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(10),
        ])
        .split(area);

    let today = chrono::Local::now().date_naive();
    f.render_widget(
        Paragraph::new(header_lines(load, &availability_notice(today))).wrap(Wrap { trim: true }),
        chunks[0],
    );
    render_headlines(f, chunks[1], &load.dataset.headline_metrics());

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[2]);
    render_table(f, middle[0], app, &load.dataset);
    render_top(f, middle[1], &load.dataset);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[3]);
    render_trend(f, bottom[0], app, &load.dataset);
    render_insights(f, bottom[1], &load.dataset);
}

fn header_lines(load: &CpiLoad, notice: &str) -> Vec<Line<'static>> {
    let source = match &load.warning {
        Some(warning) => Span::styled(warning.clone(), theme::warning()),
        None => Span::styled(load.source_text(), theme::positive()),
    };
    vec![
        Line::from(Span::styled(notice.to_string(), theme::muted())),
        Line::from(source),
    ]
}

fn render_headlines(f: &mut Frame, area: Rect, metrics: &[HeadlineMetric]) {
    if metrics.is_empty() {
        return;
    }
    let constraints = vec![Constraint::Ratio(1, metrics.len() as u32); metrics.len()];
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    let palette = theme::palette();
    for (metric, card) in metrics.iter().zip(cards.iter()) {
        let (value, value_style) = match metric.rate {
            Some(rate) => (
                format!("{rate:.1}%"),
                Style::default()
                    .fg(palette.inflation_color(InflationStatus::from_rate(rate)))
                    .add_modifier(Modifier::BOLD),
            ),
            None => ("N/A".to_string(), theme::muted()),
        };
        let lines = vec![
            Line::from(vec![
                Span::styled(format!("{}: ", metric.label), theme::secondary()),
                Span::styled(value, value_style),
            ]),
            Line::from(Span::styled(metric.delta_text(), theme::muted())),
        ];
        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(theme::muted());
        f.render_widget(Paragraph::new(lines).block(block), *card);
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &AppState, dataset: &CpiDataset) {
    let palette = theme::palette();
    let rows = dataset.latest_rows();
    let month = dataset
        .latest_month()
        .map(|m| m.format("%B %Y").to_string())
        .unwrap_or_default();

    let body = rows.iter().map(|o| {
        let status = InflationStatus::from_rate(o.rate);
        let charted = if app.inflation.is_charted(&o.category) {
            "●"
        } else {
            " "
        };
        Row::new(vec![
            Cell::from(charted).style(theme::accent()),
            Cell::from(o.category.clone()),
            Cell::from(format!("{:.1}%", o.rate))
                .style(Style::default().fg(palette.inflation_color(status))),
            Cell::from(format!("{} {}", status.light(), status.label())),
        ])
    });

    let header = Row::new(vec!["", "Category", "Annual Rate", "Status"]).style(theme::accent_bold());
    let table = Table::new(
        body,
        [
            Constraint::Length(1),
            Constraint::Length(30),
            Constraint::Length(12),
            Constraint::Min(16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(theme::muted())
            .title(format!(" CPI by Category - {month} [Space] chart "))
            .title_style(theme::accent_bold()),
    )
    .row_highlight_style(theme::cursor());

    let mut state = TableState::default().with_selected(if rows.is_empty() {
        None
    } else {
        Some(app.inflation.cursor.min(rows.len() - 1))
    });
    f.render_stateful_widget(table, area, &mut state);
}

fn render_top(f: &mut Frame, area: Rect, dataset: &CpiDataset) {
    let palette = theme::palette();
    let bars: Vec<Bar> = dataset
        .top(TOP_CATEGORIES)
        .into_iter()
        .map(|o| {
            let status = InflationStatus::from_rate(o.rate);
            Bar::default()
                .value((o.rate.max(0.0) * 10.0).round() as u64)
                .text_value(format!("{:.1}%", o.rate))
                .label(Line::from(o.category.clone()))
                .style(Style::default().fg(palette.inflation_color(status)))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(theme::muted())
                .title(format!(" Top {TOP_CATEGORIES} Categories "))
                .title_style(theme::accent_bold()),
        )
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));
    f.render_widget(chart, area);
}

fn render_trend(f: &mut Frame, area: Rect, app: &AppState, dataset: &CpiDataset) {
    let palette = theme::palette();
    let colors = palette.series_colors();

    let months: Vec<_> = {
        let mut months: Vec<_> = dataset.observations.iter().map(|o| o.month).collect();
        months.sort();
        months.dedup();
        months
    };
    if months.is_empty() {
        return;
    }
    let x_max = (months.len().saturating_sub(1)).max(1) as f64;

    let series: Vec<(String, Vec<(f64, f64)>)> = app
        .inflation
        .chart_categories
        .iter()
        .map(|category| {
            let points: Vec<(f64, f64)> = dataset
                .series(category)
                .into_iter()
                .filter_map(|(month, rate)| {
                    months
                        .binary_search(&month)
                        .ok()
                        .map(|i| (i as f64, rate))
                })
                .collect();
            (category.clone(), points)
        })
        .filter(|(_, points)| !points.is_empty())
        .collect();

    let target = vec![(0.0, TARGET_RATE), (x_max, TARGET_RATE)];
    let zero = vec![(0.0, DEFLATION_THRESHOLD), (x_max, DEFLATION_THRESHOLD)];

    let rates: Vec<f64> = series
        .iter()
        .flat_map(|(_, points)| points.iter().map(|p| p.1))
        .chain([TARGET_RATE, DEFLATION_THRESHOLD])
        .collect();
    let Some(bounds) = widgets::y_bounds(&[rates.as_slice()]) else {
        return;
    };

    let mut datasets: Vec<Dataset> = series
        .iter()
        .enumerate()
        .map(|(i, (name, points))| {
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(colors[i % colors.len()]))
                .data(points)
        })
        .collect();
    datasets.push(
        Dataset::default()
            .name("2% Target")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(theme::positive())
            .data(&target),
    );
    datasets.push(
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(theme::muted())
            .data(&zero),
    );

    let first = months[0].format("%b %Y").to_string();
    let last = months[months.len() - 1].format("%b %Y").to_string();
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(theme::muted())
                .title(" CPI Trends Over Time ")
                .title_style(theme::accent_bold()),
        )
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([0.0, x_max])
                .labels(vec![
                    Span::styled(first, theme::muted()),
                    Span::styled(last, theme::muted()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Rate (%)", theme::muted()))
                .style(theme::muted())
                .bounds(bounds)
                .labels(widgets::value_labels(bounds, |v| format!("{v:.1}"))),
        );
    f.render_widget(chart, area);
}

fn render_insights(f: &mut Frame, area: Rect, dataset: &CpiDataset) {
    let mut lines = vec![Line::from(Span::styled("Key Insights", theme::accent_bold()))];
    match dataset.insights() {
        Some(insights) => lines.extend(
            insights
                .lines()
                .into_iter()
                .map(|l| Line::from(Span::styled(format!("• {l}"), theme::secondary()))),
        ),
        None => lines.push(Line::from(Span::styled("No data", theme::muted()))),
    }
    lines.push(Line::from(""));
    for status in [
        InflationStatus::Deflation,
        InflationStatus::Low,
        InflationStatus::Moderate,
        InflationStatus::High,
    ] {
        lines.push(Line::from(Span::styled(
            format!("{} {}", status.light(), status.label()),
            theme::muted(),
        )));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sparkvibe_core::cpi::CpiSource;

    #[test]
    fn header_prefers_warning() {
        let dataset = CpiDataset::new(Vec::new(), CpiSource::Synthetic);
        let load = CpiLoad {
            dataset,
            warning: Some("BLS API access limited".into()),
        };
        let notice = availability_notice(NaiveDate::from_ymd_opt(2024, 6, 20).unwrap());
        let lines = header_lines(&load, &notice);
        assert!(lines[0].spans[0].content.contains("April 2024"));
        assert_eq!(lines[1].spans[0].content, "BLS API access limited");
    }

    #[test]
    fn header_shows_source_without_warning() {
        let load = CpiLoad {
            dataset: CpiDataset::new(Vec::new(), CpiSource::Live { categories: 12 }),
            warning: None,
        };
        let lines = header_lines(&load, "notice");
        assert!(lines[1].spans[0].content.contains("for 12 categories"));
    }
}
