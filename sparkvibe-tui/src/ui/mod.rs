//! Top-level UI layout — tab bar, active tab, status bar and overlays.

pub mod cross_tab;
pub mod inflation_tab;
pub mod overlays;
pub mod status_bar;
pub mod summary_tab;
pub mod volume_tab;
pub mod widgets;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Tabs};
use ratatui::Frame;

use crate::app::{AppState, Overlay, Tab};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_tabs(f, chunks[0], app);
    draw_tab(f, chunks[1], app);
    status_bar::render(f, chunks[2], app);

    match app.overlay {
        Overlay::Help => overlays::render_help(f, chunks[1], app),
        Overlay::ErrorHistory => overlays::render_error_history(f, chunks[1], app),
        Overlay::None => {}
    }
}

fn draw_tabs(f: &mut Frame, area: Rect, app: &AppState) {
    let titles: Vec<Line> = (0..Tab::COUNT)
        .filter_map(Tab::from_index)
        .map(|t| Line::from(format!("{} {}", t.index() + 1, t.label())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.active_tab.index())
        .style(theme::muted())
        .highlight_style(theme::accent_bold())
        .divider("|");
    f.render_widget(tabs, area);
}

/// Draw the active tab inside its border.
fn draw_tab(f: &mut Frame, area: Rect, app: &AppState) {
    let tab = app.active_tab;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" SparkVibe - {} [{}] ", tab.label(), tab.index() + 1))
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match tab {
        Tab::Summary => summary_tab::render(f, inner, app),
        Tab::GoldenCross | Tab::DeathCross => {
            if let Some(kind) = tab.cross_kind() {
                cross_tab::render(f, inner, app, kind);
            }
        }
        Tab::Volume => volume_tab::render(f, inner, app),
        Tab::Inflation => inflation_tab::render(f, inner, app),
    }
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn centered_rect_is_inside() {
        let area = Rect::new(0, 0, 100, 50);
        let r = centered_rect(60, 40, area);
        assert_eq!(r.width, 60);
        assert_eq!(r.height, 20);
        assert_eq!(r.x, 20);
        assert_eq!(r.y, 15);
    }

    #[test]
    fn every_tab_draws_without_data() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        let mut terminal = Terminal::new(TestBackend::new(160, 48)).unwrap();
        for i in 0..Tab::COUNT {
            app.active_tab = Tab::from_index(i).unwrap();
            terminal.draw(|f| draw(f, &app)).unwrap();
        }
        app.overlay = Overlay::Help;
        terminal.draw(|f| draw(f, &app)).unwrap();
        app.overlay = Overlay::ErrorHistory;
        terminal.draw(|f| draw(f, &app)).unwrap();
    }
}
