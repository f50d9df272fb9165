//! Bottom status bar — fetch progress or status message, last update,
//! market status and auto-refresh flag.

use chrono::NaiveDateTime;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use sparkvibe_runner::views::last_updated_text;
use sparkvibe_runner::MarketStatus;

use crate::app::{AppState, StatusLevel};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let now = chrono::Local::now().naive_local();
    let right = right_spans(app, now);
    let right_width: usize = right.iter().map(|s| s.width()).sum();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(right_width as u16)])
        .split(area);

    let mut left = vec![Span::styled(" [?]help [r]efresh [a]uto [e]rrors [q]uit", theme::muted())];
    left.push(Span::raw(" | "));
    if let Some(progress) = &app.fetch_progress {
        left.push(Span::styled(progress.text(), theme::accent()));
    } else if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        left.push(Span::styled(msg.as_str(), style));
    }

    f.render_widget(Paragraph::new(Line::from(left)), chunks[0]);
    f.render_widget(Paragraph::new(Line::from(right)), chunks[1]);
}

fn right_spans(app: &AppState, now: NaiveDateTime) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if let Some(at) = app.last_update {
        spans.push(Span::styled(last_updated_text(at), theme::secondary()));
        spans.push(Span::raw(" | "));
    }
    let status = MarketStatus::at(now);
    let style = match status {
        MarketStatus::Open => theme::positive(),
        MarketStatus::Closed => theme::negative(),
    };
    spans.push(Span::styled(status.label(), style));
    spans.push(Span::raw(" | "));
    let auto = if app.auto_refresh {
        Span::styled(
            format!("auto {}s ", app.refresh_interval().as_secs()),
            theme::positive(),
        )
    } else {
        Span::styled("auto off ", theme::muted())
    };
    spans.push(auto);
    spans
}
