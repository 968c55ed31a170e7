// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Window deactivation: snapshot the window, persist it, then close it.
//!
//! The live window is only destroyed after the snapshot write has been
//! acknowledged by storage. Any failure before that point leaves the window
//! open and the store untouched.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use tabkeep_config::model::SnapshotConfig;
use tabkeep_core::types::{Tab, TabSnapshot, WindowSnapshot};
use tabkeep_core::{BrowserAdapter, TabId, TabkeepError, WindowId};

use crate::relationships::RelationshipStore;
use crate::snapshots::SnapshotStore;

pub struct SnapshotCapture {
    browser: Arc<dyn BrowserAdapter>,
    relationships: RelationshipStore,
    snapshots: SnapshotStore,
    name_template: String,
}

impl SnapshotCapture {
    pub fn new(
        browser: Arc<dyn BrowserAdapter>,
        relationships: RelationshipStore,
        snapshots: SnapshotStore,
        config: &SnapshotConfig,
    ) -> Self {
        Self {
            browser,
            relationships,
            snapshots,
            name_template: config.default_name.clone(),
        }
    }

    /// Deactivates `window_id`.
    ///
    /// Returns `Ok(false)` without side effects when the window has no tabs
    /// or no longer exists.
    pub async fn capture(&self, window_id: WindowId) -> Result<bool, TabkeepError> {
        let mut tabs = match self.browser.query_window_tabs(window_id).await {
            Ok(tabs) => tabs,
            Err(e) if e.is_transient() => {
                debug!(window_id = %window_id, error = %e, "window gone before capture");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        if tabs.is_empty() {
            debug!(window_id = %window_id, "no tabs to capture");
            return Ok(false);
        }
        tabs.sort_by_key(|t| t.index);

        let parents: HashMap<TabId, TabId> = self
            .relationships
            .edges()
            .await?
            .into_iter()
            .map(|edge| (edge.child, edge.parent))
            .collect();
        let snapshot_tabs: Vec<TabSnapshot> = tabs
            .iter()
            .map(|tab| snapshot_tab(tab, parents.get(&tab.id).copied()))
            .collect();

        let snapshot = WindowSnapshot {
            id: window_id,
            deactivated_at: Utc::now(),
            name: render_name(&self.name_template, &tabs),
            tabs: snapshot_tabs,
        };
        let tab_count = snapshot.tabs.len();
        let stored = self.snapshots.prepend(snapshot).await?;
        debug!(window_id = %window_id, stored, "snapshot persisted");

        match self.browser.remove_window(window_id).await {
            Ok(()) => {}
            Err(e) if e.is_transient() => {
                debug!(window_id = %window_id, error = %e, "window already closed");
            }
            Err(e) => {
                warn!(window_id = %window_id, error = %e, "snapshot saved but window could not be closed");
            }
        }
        info!(window_id = %window_id, tabs = tab_count, "window deactivated");
        Ok(true)
    }
}

fn snapshot_tab(tab: &Tab, parent: Option<TabId>) -> TabSnapshot {
    TabSnapshot {
        url: tab.url.clone(),
        title: tab.title.clone(),
        favicon_url: tab.fav_icon_url.clone(),
        pinned: tab.pinned,
        index: tab.index,
        group_id: tab.group_id,
        original_id: tab.id,
        parent_tab_id: parent,
    }
}

/// Expands `{count}` and `{title}` in a snapshot name template.
///
/// `tabs` must be non-empty and ordered by index.
pub fn render_name(template: &str, tabs: &[Tab]) -> String {
    let title = tabs
        .first()
        .map(|t| if t.title.trim().is_empty() { t.url.as_str() } else { t.title.trim() })
        .unwrap_or_default();
    let rendered = template
        .replace("{count}", &tabs.len().to_string())
        .replace("{title}", title);
    let rendered = rendered.trim();
    if rendered.is_empty() {
        format!("Window ({} tabs)", tabs.len())
    } else {
        rendered.to_string()
    }
}

#[cfg(test)]
mod tests {
    use tabkeep_core::TabId;
    use tabkeep_storage::{MemoryStorage, Repositories};
    use tabkeep_test_utils::{FlakyStorage, MockBrowser, fixtures};

    use super::*;
    use crate::INACTIVE_WINDOWS_KEY;

    struct Fixture {
        browser: Arc<MockBrowser>,
        relationships: RelationshipStore,
        snapshots: SnapshotStore,
        capture: SnapshotCapture,
    }

    fn fixture_with(storage: Arc<dyn tabkeep_core::StorageAdapter>) -> Fixture {
        let repos = Repositories::new(Arc::clone(&storage));
        let browser = Arc::new(MockBrowser::new().with_store_watch(storage, INACTIVE_WINDOWS_KEY));
        let relationships = RelationshipStore::new(&repos);
        let snapshots = SnapshotStore::new(&repos);
        let capture = SnapshotCapture::new(
            browser.clone(),
            relationships.clone(),
            snapshots.clone(),
            &SnapshotConfig::default(),
        );
        Fixture {
            browser,
            relationships,
            snapshots,
            capture,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn name_template_expands_placeholders() {
        let mut first = fixtures::tab(1, 1, 0);
        first.title = "Docs".into();
        let tabs = vec![first, fixtures::tab(2, 1, 1)];
        assert_eq!(render_name("{title} (+{count} tabs)", &tabs), "Docs (+2 tabs)");
        assert_eq!(render_name("", &tabs), "Window (2 tabs)");
    }

    #[tokio::test]
    async fn capture_embeds_parents_and_persists_before_closing() {
        let f = fixture();
        let w = f.browser.open_window().await;
        let t1 = f.browser.open_tab(w, "https://a.test/", None).await;
        let t2 = f.browser.open_tab(w, "https://b.test/", Some(t1.id)).await;
        f.relationships.record_child(t2.id, t1.id).await.unwrap();

        assert!(f.capture.capture(w).await.unwrap());

        let stored = f.snapshots.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        let tabs = &stored[0].tabs;
        assert_eq!(tabs[0].original_id, t1.id);
        assert_eq!(tabs[0].parent_tab_id, None);
        assert_eq!(tabs[1].original_id, t2.id);
        assert_eq!(tabs[1].parent_tab_id, Some(t1.id));
        assert_eq!(f.browser.removed_windows().await, vec![w]);
        assert_eq!(f.browser.store_lengths_at_remove().await, vec![1]);
    }

    #[tokio::test]
    async fn parents_resolve_among_unrelated_edges() {
        let f = fixture();
        let other = f.browser.open_window().await;
        let mut prev = f.browser.open_tab(other, "https://other.test/0", None).await;
        for i in 1..20 {
            let next = f
                .browser
                .open_tab(other, &format!("https://other.test/{i}"), Some(prev.id))
                .await;
            f.relationships.record_child(next.id, prev.id).await.unwrap();
            prev = next;
        }
        let w = f.browser.open_window().await;
        let root = f.browser.open_tab(w, "https://a.test/", None).await;
        let child = f.browser.open_tab(w, "https://b.test/", Some(root.id)).await;
        f.relationships.record_child(child.id, root.id).await.unwrap();

        assert!(f.capture.capture(w).await.unwrap());

        let stored = f.snapshots.list().await.unwrap();
        let parents: Vec<Option<TabId>> =
            stored[0].tabs.iter().map(|t| t.parent_tab_id).collect();
        assert_eq!(parents, vec![None, Some(root.id)]);
    }

    #[tokio::test]
    async fn tabs_are_ordered_by_index() {
        let f = fixture();
        let w = f.browser.open_window().await;
        let a = f.browser.open_tab(w, "https://a.test/", None).await;
        let b = f
            .browser
            .create_tab(tabkeep_core::types::CreateTab {
                window_id: w,
                url: "https://b.test/".into(),
                pinned: false,
                index: Some(0),
                active: false,
            })
            .await
            .unwrap();
        f.capture.capture(w).await.unwrap();
        let ids: Vec<TabId> = f.snapshots.list().await.unwrap()[0]
            .tabs
            .iter()
            .map(|t| t.original_id)
            .collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn empty_window_is_not_captured() {
        let f = fixture();
        let w = f.browser.open_window().await;
        assert!(!f.capture.capture(w).await.unwrap());
        assert!(f.snapshots.list().await.unwrap().is_empty());
        assert!(f.browser.removed_windows().await.is_empty());
    }

    #[tokio::test]
    async fn persistence_failure_keeps_window_open() {
        let storage = Arc::new(FlakyStorage::new());
        let f = fixture_with(storage.clone());
        let w = f.browser.open_window().await;
        f.browser.open_tab(w, "https://a.test/", None).await;

        storage.set_fail_writes(true);
        assert!(f.capture.capture(w).await.is_err());
        assert!(f.browser.removed_windows().await.is_empty());
        assert_eq!(f.browser.window_ids().await, vec![w]);
        storage.set_fail_writes(false);
        assert!(f.snapshots.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_captures_both_persist() {
        let f = fixture();
        let w1 = f.browser.open_window().await;
        let w2 = f.browser.open_window().await;
        f.browser.open_tab(w1, "https://a.test/", None).await;
        f.browser.open_tab(w2, "https://b.test/", None).await;

        let (a, b) = tokio::join!(f.capture.capture(w1), f.capture.capture(w2));
        assert!(a.unwrap() && b.unwrap());
        assert_eq!(f.snapshots.list().await.unwrap().len(), 2);
    }
}
