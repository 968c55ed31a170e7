// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixture builders for domain values.

use chrono::{TimeZone, Utc};

use tabkeep_core::types::{GROUP_ID_NONE, Tab, TabSnapshot, TabStatus, WindowSnapshot};
use tabkeep_core::{TabId, WindowId};

/// A complete, ungrouped tab at `index` with a per-id example URL.
pub fn tab(id: i64, window_id: i64, index: u32) -> Tab {
    Tab {
        id: TabId(id),
        window_id: WindowId(window_id),
        index,
        url: format!("https://example.com/page/{id}"),
        title: format!("Page {id}"),
        fav_icon_url: None,
        pinned: false,
        active: false,
        group_id: GROUP_ID_NONE,
        opener_tab_id: None,
        status: TabStatus::Complete,
    }
}

/// Snapshot entry for a tab that had `parent` as its opener at capture time.
pub fn tab_snapshot(original_id: i64, index: u32, parent: Option<i64>) -> TabSnapshot {
    TabSnapshot {
        url: format!("https://example.com/page/{original_id}"),
        title: format!("Page {original_id}"),
        favicon_url: None,
        pinned: false,
        index,
        group_id: GROUP_ID_NONE,
        original_id: TabId(original_id),
        parent_tab_id: parent.map(TabId),
    }
}

/// A snapshot deactivated `millis` after the epoch, for deterministic ordering.
pub fn window_snapshot(id: i64, millis: i64, tabs: Vec<TabSnapshot>) -> WindowSnapshot {
    WindowSnapshot {
        id: WindowId(id),
        deactivated_at: Utc
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(Utc::now),
        name: format!("Window {id}"),
        tabs,
    }
}
