// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tabkeep windows` command implementation.

use std::collections::HashMap;

use tabkeep_core::types::{TabSnapshot, WindowSnapshot};
use tabkeep_core::{TabId, TabkeepError};
use tabkeep_session::{INACTIVE_WINDOWS_KEY, SnapshotStore, build_forest, snapshot_edges};

/// Print every inactive window, newest first.
pub async fn run_windows(store: &SnapshotStore, json: bool) -> Result<(), TabkeepError> {
    let windows = store.list().await?;
    if json {
        let rendered = serde_json::to_string_pretty(&windows).map_err(|source| {
            TabkeepError::Serialization {
                key: INACTIVE_WINDOWS_KEY.to_string(),
                source,
            }
        })?;
        println!("{rendered}");
        return Ok(());
    }

    if windows.is_empty() {
        println!("no inactive windows");
        return Ok(());
    }
    for (index, snapshot) in windows.iter().enumerate() {
        for line in render_window(index, snapshot) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Header line followed by the tab tree, children indented under openers.
pub fn render_window(index: usize, snapshot: &WindowSnapshot) -> Vec<String> {
    let mut lines = vec![format!(
        "[{index}] {} ({} tabs, deactivated {})",
        snapshot.name,
        snapshot.tabs.len(),
        snapshot.deactivated_at.format("%Y-%m-%d %H:%M UTC"),
    )];

    let by_id: HashMap<TabId, &TabSnapshot> =
        snapshot.tabs.iter().map(|t| (t.original_id, t)).collect();
    let forest = build_forest(&snapshot.tabs, &snapshot_edges(snapshot));
    for entry in &forest.order {
        let Some(tab) = by_id.get(&entry.id) else {
            continue;
        };
        let label = if tab.title.is_empty() { &tab.url } else { &tab.title };
        let pin = if tab.pinned { " [pinned]" } else { "" };
        lines.push(format!("{}- {label}{pin}", "  ".repeat(entry.depth + 1)));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabkeep_test_utils::fixtures::{tab_snapshot, window_snapshot};

    #[test]
    fn children_are_indented_under_parents() {
        let snapshot = window_snapshot(
            7,
            0,
            vec![
                tab_snapshot(1, 0, None),
                tab_snapshot(2, 1, Some(1)),
                tab_snapshot(3, 2, None),
            ],
        );
        let lines = render_window(0, &snapshot);
        assert_eq!(
            lines,
            vec![
                "[0] Window 7 (3 tabs, deactivated 1970-01-01 00:00 UTC)".to_string(),
                "  - Page 1".to_string(),
                "    - Page 2".to_string(),
                "  - Page 3".to_string(),
            ]
        );
    }

    #[test]
    fn untitled_tabs_fall_back_to_url() {
        let mut tab = tab_snapshot(1, 0, None);
        tab.title.clear();
        tab.pinned = true;
        let lines = render_window(3, &window_snapshot(1, 0, vec![tab]));
        assert_eq!(lines[1], "  - https://example.com/page/1 [pinned]");
    }
}
