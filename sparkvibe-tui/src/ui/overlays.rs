//! Overlay widgets: key help and error history.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;
use crate::ui::centered_rect;

const KEYS: [(&str, &str); 11] = [
    ("1-5", "switch tab"),
    ("Tab / Shift-Tab", "next / previous tab"),
    ("j / k", "move cursor"),
    ("s", "cycle sort column"),
    ("S", "reverse sort"),
    ("Space", "toggle CPI category on the trend chart"),
    ("r", "refresh now"),
    ("a", "toggle auto-refresh"),
    ("e", "error history"),
    ("?", "this help"),
    ("q", "quit"),
];

pub fn render_help(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(60, 60, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(" Keys [any key]close ")
        .title_style(theme::accent_bold());

    let mut lines = vec![Line::from("")];
    for (key, action) in KEYS {
        lines.push(Line::from(vec![
            Span::styled(format!("{key:>16}  "), theme::accent()),
            Span::styled(action, theme::text()),
        ]));
    }
    lines.push(Line::from(""));
    metric_line(&mut lines, "Data mode", app.config.mode.label());
    metric_line(
        &mut lines,
        "Auto-refresh",
        &format!("every {}s", app.refresh_interval().as_secs()),
    );
    metric_line(
        &mut lines,
        "Cross windows",
        &format!(
            "{}/{} day MA, {} day look-back",
            app.config.cross.fast_period, app.config.cross.slow_period, app.config.cross.lookback
        ),
    );

    f.render_widget(Paragraph::new(lines).block(block), popup);
}

/// Error history overlay.
pub fn render_error_history(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative())
        .title(format!(
            " Error History ({}) [Esc]close [j/k]scroll ",
            app.error_history.len()
        ))
        .title_style(theme::negative());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if app.error_history.is_empty() {
        let text = Paragraph::new(Span::styled("No errors recorded.", theme::muted()));
        f.render_widget(text, inner);
        return;
    }

    let visible = inner.height as usize;
    let mut lines: Vec<Line> = Vec::new();
    for (i, err) in app
        .error_history
        .iter()
        .enumerate()
        .skip(app.error_scroll)
        .take(visible)
    {
        let style = if i == app.error_scroll {
            theme::negative().add_modifier(Modifier::BOLD)
        } else {
            theme::secondary()
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] ", err.timestamp.format("%H:%M:%S")),
                theme::muted(),
            ),
            Span::styled(format!("[{}] ", err.category.label()), theme::warning()),
            Span::styled(err.message.as_str(), style),
        ]));
        if !err.context.is_empty() {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(err.context.as_str(), theme::muted()),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn metric_line(lines: &mut Vec<Line>, label: &str, value: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("{label:>16}  "), theme::muted()),
        Span::styled(value.to_string(), theme::secondary()),
    ]));
}
