//! Shared widget builders: sortable tables and line-chart helpers.

use chrono::NaiveDate;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use sparkvibe_runner::{TableColumn, TableSort};

use crate::app::TableView;
use crate::theme;

/// Header row; the sorted column carries the direction arrow.
fn header_row<C: TableColumn>(sort: &TableSort<C>) -> Row<'static> {
    let cells = C::ALL.iter().map(|&c| {
        let text = match sort.column {
            Some(active) if active == c => format!("{} {}", c.header(), sort.direction.arrow()),
            _ => c.header().to_string(),
        };
        Cell::from(text)
    });
    Row::new(cells).style(theme::accent_bold())
}

/// Render a sortable table with the cursor row highlighted.
///
/// `style` picks the style of each cell, e.g. green/pink for changes.
pub fn render_table<C, F>(
    f: &mut Frame,
    area: Rect,
    rows: &[&C::Row],
    view: &TableView<C>,
    widths: &[Constraint],
    style: F,
) where
    C: TableColumn,
    F: Fn(C, &C::Row) -> Style,
{
    let body = rows.iter().map(|row| {
        Row::new(
            C::ALL
                .iter()
                .map(|&c| Cell::from(c.cell(row)).style(style(c, row))),
        )
    });

    let table = Table::new(body, widths.iter().copied())
        .header(header_row(&view.sort))
        .column_spacing(1)
        .row_highlight_style(theme::cursor())
        .highlight_symbol("▶ ");

    let mut state = TableState::default().with_selected(if rows.is_empty() {
        None
    } else {
        Some(view.cursor.min(rows.len() - 1))
    });
    f.render_stateful_widget(table, area, &mut state);
}

/// Muted placeholder text, e.g. before the first poll finishes.
pub fn render_placeholder(f: &mut Frame, area: Rect, messages: &[&str]) {
    let mut lines = vec![Line::from("")];
    lines.extend(
        messages
            .iter()
            .map(|m| Line::from(Span::styled(m.to_string(), theme::muted()))),
    );
    f.render_widget(Paragraph::new(lines), area);
}

/// Index-based points for a chart series, skipping NaN warm-up values.
pub fn series_points(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (i as f64, v))
        .collect()
}

/// Y bounds over every series with 5% padding, ignoring NaN.
pub fn y_bounds(series: &[&[f64]]) -> Option<[f64; 2]> {
    let mut values = series.iter().flat_map(|s| s.iter()).copied().filter(|v| v.is_finite());
    let first = values.next()?;
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let padding = if max > min { (max - min) * 0.05 } else { 1.0 };
    Some([min - padding, max + padding])
}

/// First, middle and last date as x-axis labels.
pub fn date_labels(dates: &[NaiveDate]) -> Vec<Span<'static>> {
    match dates {
        [] => Vec::new(),
        [only] => vec![Span::styled(only.format("%Y-%m-%d").to_string(), theme::muted())],
        _ => {
            let mid = dates[dates.len() / 2];
            [dates[0], mid, dates[dates.len() - 1]]
                .iter()
                .map(|d| Span::styled(d.format("%Y-%m-%d").to_string(), theme::muted()))
                .collect()
        }
    }
}

/// Min/mid/max labels for a y-axis.
pub fn value_labels(bounds: [f64; 2], fmt: impl Fn(f64) -> String) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|&v| Span::styled(fmt(v), theme::muted()))
        .collect()
}
