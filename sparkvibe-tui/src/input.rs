//! Keyboard input dispatch: overlays first, then global keys, then the active tab.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Overlay, Tab};

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match app.overlay {
        Overlay::Help => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys.
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            if let Some(tab) = Tab::from_index(index) {
                app.active_tab = tab;
            }
            return;
        }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.active_tab = app.active_tab.prev();
            } else {
                app.active_tab = app.active_tab.next();
            }
            return;
        }
        KeyCode::BackTab => {
            app.active_tab = app.active_tab.prev();
            return;
        }
        KeyCode::Char('r') => {
            app.request_refresh();
            return;
        }
        KeyCode::Char('a') => {
            app.toggle_auto_refresh();
            return;
        }
        KeyCode::Char('e') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
            return;
        }
        KeyCode::Char('?') => {
            app.overlay = Overlay::Help;
            return;
        }
        _ => {}
    }

    // 3. Tab-specific keys.
    match app.active_tab {
        Tab::Inflation => handle_inflation_key(app, key),
        tab => handle_table_key(app, tab, key),
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

/// Cursor and sort keys shared by the four market tables.
fn handle_table_key(app: &mut AppState, tab: Tab, key: KeyEvent) {
    let rows = app.row_count(tab);
    match (tab, tab.cross_kind()) {
        (Tab::Summary, _) => match key.code {
            KeyCode::Char('j') | KeyCode::Down => app.summary.move_down(rows),
            KeyCode::Char('k') | KeyCode::Up => app.summary.move_up(),
            KeyCode::Char('s') => app.summary.sort.cycle(),
            KeyCode::Char('S') => app.summary.sort.reverse(),
            _ => return,
        },
        (Tab::Volume, _) => match key.code {
            KeyCode::Char('j') | KeyCode::Down => app.volume.move_down(rows),
            KeyCode::Char('k') | KeyCode::Up => app.volume.move_up(),
            KeyCode::Char('s') => app.volume.sort.cycle(),
            KeyCode::Char('S') => app.volume.sort.reverse(),
            _ => return,
        },
        (_, Some(kind)) => {
            let view = app.cross_view_mut(kind);
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => view.move_down(rows),
                KeyCode::Char('k') | KeyCode::Up => view.move_up(),
                KeyCode::Char('s') => view.sort.cycle(),
                KeyCode::Char('S') => view.sort.reverse(),
                _ => return,
            }
        }
        _ => return,
    }

    if matches!(key.code, KeyCode::Char('s') | KeyCode::Char('S')) {
        let label = match tab {
            Tab::Summary => app.summary.sort.label(),
            Tab::Volume => app.volume.sort.label(),
            _ => tab
                .cross_kind()
                .map(|k| app.cross_view(k).sort.label())
                .unwrap_or_default(),
        };
        app.set_status(format!("Sorted by {label}"));
    }
}

fn handle_inflation_key(app: &mut AppState, key: KeyEvent) {
    let rows = app.row_count(Tab::Inflation);
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if app.inflation.cursor + 1 < rows {
                app.inflation.cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.inflation.cursor = app.inflation.cursor.saturating_sub(1);
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            let category = app
                .cpi_rows()
                .get(app.inflation.cursor)
                .map(|o| o.category.clone());
            if let Some(category) = category {
                app.inflation.toggle(&category);
                let state = if app.inflation.is_charted(&category) {
                    "added to"
                } else {
                    "removed from"
                };
                app.set_status(format!("{category} {state} the trend chart"));
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use crate::worker::WorkerCommand;
    use crossterm::event::KeyEventState;
    use sparkvibe_runner::SummaryColumn;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn digits_switch_tabs() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        handle_key(&mut app, press(KeyCode::Char('5')));
        assert_eq!(app.active_tab, Tab::Inflation);
        handle_key(&mut app, press(KeyCode::Char('2')));
        assert_eq!(app.active_tab, Tab::GoldenCross);
        handle_key(&mut app, press(KeyCode::BackTab));
        assert_eq!(app.active_tab, Tab::Summary);
    }

    #[test]
    fn release_events_are_ignored() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        handle_key(&mut app, key);
        assert!(app.running);
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn help_overlay_swallows_next_key() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        handle_key(&mut app, press(KeyCode::Char('?')));
        assert_eq!(app.overlay, Overlay::Help);
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert_eq!(app.overlay, Overlay::None);
        assert!(app.running);
    }

    #[test]
    fn sort_keys_cycle_and_reverse() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        handle_key(&mut app, press(KeyCode::Char('s')));
        assert_eq!(app.summary.sort.column, Some(SummaryColumn::Symbol));
        let direction = app.summary.sort.direction;
        handle_key(&mut app, press(KeyCode::Char('S')));
        assert_eq!(app.summary.sort.direction, direction.toggle());
        assert!(app
            .status_message
            .as_ref()
            .is_some_and(|(m, _)| m.starts_with("Sorted by Symbol")));
    }

    #[test]
    fn refresh_key_sends_poll() {
        let (mut app, cmd_rx, _resp_tx) = test_app();
        handle_key(&mut app, press(KeyCode::Char('r')));
        assert!(matches!(cmd_rx.try_recv(), Ok(WorkerCommand::Poll { .. })));
    }

    #[test]
    fn error_overlay_scroll_is_bounded() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        app.push_error(crate::app::ErrorCategory::Other, "one".into(), String::new());
        app.push_error(crate::app::ErrorCategory::Other, "two".into(), String::new());
        handle_key(&mut app, press(KeyCode::Char('e')));
        for _ in 0..5 {
            handle_key(&mut app, press(KeyCode::Char('j')));
        }
        assert_eq!(app.error_scroll, 1);
        handle_key(&mut app, press(KeyCode::Esc));
        assert_eq!(app.overlay, Overlay::None);
    }
}
