//! App state persistence — JSON save/load across restarts.
//!
//! Only view preferences are kept; market data is always re-fetched.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use sparkvibe_runner::{SortDirection, SummaryColumn};

use crate::app::{AppState, InflationView, Tab};

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub active_tab: Tab,
    pub auto_refresh: bool,
    pub cpi_categories: Vec<String>,
    pub summary_sort: Option<SummaryColumn>,
    pub summary_direction: SortDirection,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            active_tab: Tab::Summary,
            auto_refresh: true,
            cpi_categories: InflationView::default().chart_categories,
            summary_sort: None,
            summary_direction: SortDirection::default(),
        }
    }
}

/// Load persisted state from disk. Returns defaults if the file is missing
/// or corrupt.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt state file");
            PersistedState::default()
        }),
        Err(_) => PersistedState::default(),
    }
}

/// Save persisted state to disk. Creates parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn extract(app: &AppState) -> PersistedState {
    PersistedState {
        active_tab: app.active_tab,
        auto_refresh: app.auto_refresh,
        cpi_categories: app.inflation.chart_categories.clone(),
        summary_sort: app.summary.sort.column,
        summary_direction: app.summary.sort.direction,
    }
}

pub fn apply(app: &mut AppState, state: PersistedState) {
    app.active_tab = state.active_tab;
    app.auto_refresh = state.auto_refresh;
    app.inflation.chart_categories = state.cpi_categories;
    app.summary.sort.column = state.summary_sort;
    app.summary.sort.direction = state.summary_direction;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let state = PersistedState {
            active_tab: Tab::Volume,
            auto_refresh: false,
            cpi_categories: vec!["Energy".into()],
            summary_sort: Some(SummaryColumn::MarketCap),
            summary_direction: SortDirection::Descending,
        };
        save(&path, &state).unwrap();
        assert_eq!(load(&path), state);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let state = load(&dir.path().join("absent.json"));
        assert_eq!(state, PersistedState::default());
        assert!(state.auto_refresh);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load(&path), PersistedState::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"active_tab":"Inflation"}"#).unwrap();
        let state = load(&path);
        assert_eq!(state.active_tab, Tab::Inflation);
        assert!(state.auto_refresh);
        assert_eq!(state.cpi_categories.len(), 5);
    }

    #[test]
    fn extract_then_apply() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        app.active_tab = Tab::DeathCross;
        app.auto_refresh = false;
        app.inflation.toggle("Food");
        app.summary.sort.cycle();
        let state = extract(&app);

        let (mut fresh, _cmd_rx2, _resp_tx2) = test_app();
        apply(&mut fresh, state);
        assert_eq!(fresh.active_tab, Tab::DeathCross);
        assert!(!fresh.auto_refresh);
        assert!(!fresh.inflation.is_charted("Food"));
        assert_eq!(fresh.summary.sort.column, Some(SummaryColumn::Symbol));
    }
}
