//! Tabs 2 and 3 — Golden Cross / Death Cross: tickers with a recent cross,
//! and the price chart with both moving averages for the selected one.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap};
use ratatui::Frame;

use sparkvibe_core::indicators::{CrossKind, CrossRecency};
use sparkvibe_runner::views::{cross_about, cross_chart, cross_headline, CrossChart};
use sparkvibe_runner::CrossColumn;

use crate::app::{sorted, AppState};
use crate::theme;
use crate::ui::widgets;

const WIDTHS: [Constraint; 6] = [
    Constraint::Length(8),
    Constraint::Length(28),
    Constraint::Length(10),
    Constraint::Length(9),
    Constraint::Length(12),
    Constraint::Length(9),
];

pub fn render(f: &mut Frame, area: Rect, app: &AppState, kind: CrossKind) {
    let lookback = app.config.cross.lookback;
    let Some(outcome) = &app.outcome else {
        widgets::render_placeholder(f, area, &["No market data yet. Press r to refresh."]);
        return;
    };

    let rows = app.cross_rows(kind);
    let view = app.cross_view(kind);
    let ordered = sorted(&rows, &view.sort);
    let table_height = (ordered.len() as u16 + 1).clamp(2, 12);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(table_height),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(area);

    let headline_style = if ordered.is_empty() {
        theme::muted()
    } else {
        Style::default().fg(theme::palette().cross_color(kind))
    };
    f.render_widget(
        Paragraph::new(Span::styled(
            cross_headline(kind, ordered.len(), lookback),
            headline_style,
        )),
        chunks[0],
    );

    widgets::render_table(f, chunks[1], &ordered, view, &WIDTHS, |c, row| match c {
        CrossColumn::ChangePct => theme::change(row.pct_change),
        CrossColumn::Symbol => theme::accent(),
        CrossColumn::Signal => Style::default().fg(
            theme::palette().recency_color(CrossRecency::from_days(row.event.days_ago)),
        ),
        _ => theme::text(),
    });

    let selected = ordered
        .get(view.cursor.min(ordered.len().saturating_sub(1)))
        .and_then(|row| outcome.get(&row.symbol));
    match selected {
        Some(ticker) => {
            let chart = cross_chart(ticker, kind, &app.config.cross);
            render_chart(f, chunks[2], &chart, app);
        }
        None => widgets::render_placeholder(f, chunks[2], &["No charts to display."]),
    }

    let about = cross_about(kind, lookback);
    let text = vec![
        Line::from(Span::styled(about[0].clone(), theme::muted())),
        Line::from(Span::styled(about[1].clone(), theme::muted())),
    ];
    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), chunks[3]);
}

fn render_chart(f: &mut Frame, area: Rect, chart: &CrossChart, app: &AppState) {
    let palette = theme::palette();
    let params = &app.config.cross;

    let close = widgets::series_points(&chart.close);
    let fast = widgets::series_points(&chart.ma_fast);
    let slow = widgets::series_points(&chart.ma_slow);
    let marker: Vec<(f64, f64)> = chart
        .latest_cross
        .and_then(|p| {
            chart
                .dates
                .iter()
                .position(|d| *d == p.date)
                .map(|i| (i as f64, p.price))
        })
        .into_iter()
        .collect();

    let Some(bounds) = widgets::y_bounds(&[
        chart.close.as_slice(),
        chart.ma_fast.as_slice(),
        chart.ma_slow.as_slice(),
    ]) else {
        widgets::render_placeholder(f, area, &["No price history for this ticker."]);
        return;
    };

    let fast_name = format!("{}-Day MA", params.fast_period);
    let slow_name = format!("{}-Day MA", params.slow_period);
    let mut datasets = vec![
        Dataset::default()
            .name("Close Price")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(palette.text_secondary))
            .data(&close),
        Dataset::default()
            .name(fast_name)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(palette.accent))
            .data(&fast),
        Dataset::default()
            .name(slow_name)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(palette.neutral))
            .data(&slow),
    ];
    if !marker.is_empty() {
        datasets.push(
            Dataset::default()
                .name(chart.kind.label())
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(palette.cross_color(chart.kind)))
                .data(&marker),
        );
    }

    let title = match chart.caption() {
        Some(caption) => format!(" {} - {} | {} ", chart.symbol, chart.company, caption),
        None => format!(" {} - {} ", chart.symbol, chart.company),
    };
    let x_max = chart.close.len().saturating_sub(1) as f64;

    let widget = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(theme::muted())
                .title(title)
                .title_style(theme::accent_bold()),
        )
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([0.0, x_max.max(1.0)])
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
