//! Tab 1 — Summary Table: every ticker with price, volume, valuation,
//! moving averages, cross flags and earnings date.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use sparkvibe_runner::views::SUMMARY_LEGEND;
use sparkvibe_runner::{MarketSummary, SummaryColumn};

use crate::app::AppState;
use crate::theme;
use crate::ui::widgets;

const WIDTHS: [Constraint; 16] = [
    Constraint::Length(7),
    Constraint::Length(24),
    Constraint::Length(10),
    Constraint::Length(9),
    Constraint::Length(10),
    Constraint::Length(14),
    Constraint::Length(14),
    Constraint::Length(8),
    Constraint::Length(8),
    Constraint::Length(6),
    Constraint::Length(6),
    Constraint::Length(10),
    Constraint::Length(10),
    Constraint::Length(13),
    Constraint::Length(13),
    Constraint::Length(13),
];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let rows = app.summary_rows();
    if rows.is_empty() {
        let message = match &app.fetch_progress {
            Some(p) => p.text(),
            None if app.poll_in_flight => "Waiting for market data...".to_string(),
            None => "No market data. Press r to refresh.".to_string(),
        };
        widgets::render_placeholder(f, area, &[&message]);
        return;
    }

    let summary = MarketSummary::from_snapshots(rows.iter().copied());
    f.render_widget(Paragraph::new(summary_lines(&summary)), chunks[0]);

    widgets::render_table(f, chunks[1], &rows, &app.summary, &WIDTHS, |c, s| match c {
        SummaryColumn::ChangePct => theme::change(s.pct_change),
        SummaryColumn::Symbol => theme::accent(),
        SummaryColumn::GoldenCross if s.golden_cross.is_some() => theme::positive(),
        SummaryColumn::DeathCross if s.death_cross.is_some() => theme::negative(),
        _ => theme::text(),
    });

    let footer = Line::from(vec![
        Span::styled(SUMMARY_LEGEND, theme::muted()),
        Span::styled(
            format!("  |  sort: {}  [s]ort [S]reverse", app.summary.sort.label()),
            theme::muted(),
        ),
    ]);
    f.render_widget(Paragraph::new(footer), chunks[2]);
}

fn pct_text(pct: Option<f64>) -> String {
    pct.map(|p| format!(" ({p:.1}%)")).unwrap_or_default()
}

fn summary_lines(summary: &MarketSummary) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled("Market Summary  ", theme::accent_bold()),
            Span::styled(format!("Total Stocks: {}", summary.total), theme::text()),
            Span::raw("   "),
            Span::styled(
                format!(
                    "Positive: {}{}",
                    summary.positive,
                    pct_text(summary.positive_pct())
                ),
                theme::positive(),
            ),
            Span::raw("   "),
            Span::styled(
                format!(
                    "Negative: {}{}",
                    summary.negative,
                    pct_text(summary.negative_pct())
                ),
                theme::negative(),
            ),
        ]),
        Line::from(vec![
            Span::raw("                "),
            Span::styled(
                format!("Golden Crosses: {}", summary.golden_crosses),
                theme::positive(),
            ),
            Span::raw("   "),
            Span::styled(
                format!("Death Crosses: {}", summary.death_crosses),
                theme::negative(),
            ),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line_shows_percentages() {
        let summary = MarketSummary {
            total: 4,
            positive: 3,
            negative: 1,
            golden_crosses: 1,
            death_crosses: 0,
        };
        let lines = summary_lines(&summary);
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(first.contains("Total Stocks: 4"));
        assert!(first.contains("Positive: 3 (75.0%)"));
        assert!(first.contains("Negative: 1 (25.0%)"));
    }

    #[test]
    fn empty_summary_has_no_percentages() {
        let lines = summary_lines(&MarketSummary::default());
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(first.contains("Positive: 0   "));
    }
}
