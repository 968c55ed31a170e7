// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Window reactivation with old → new tab identity remapping.
//!
//! Restore is best-effort past the window itself: a tab that cannot be
//! recreated is recorded and skipped, and every relationship edge touching
//! it is dropped rather than written with a dangling identity.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use tabkeep_config::model::SnapshotConfig;
use tabkeep_core::types::{CreateTab, CreateWindow, TabSnapshot, TabUpdate, WindowSnapshot};
use tabkeep_core::{BrowserAdapter, TabId, TabkeepError, WindowId};

use crate::relationships::RelationshipStore;
use crate::snapshots::SnapshotStore;

/// A snapshot tab that could not be recreated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTab {
    pub original_id: TabId,
    pub url: String,
    pub error: String,
}

/// Result of restoring one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub window_id: Option<WindowId>,
    /// Snapshot `originalId` to the identity of its recreated tab.
    pub mapping: BTreeMap<TabId, TabId>,
    pub failed_tabs: Vec<FailedTab>,
    /// `(new child, new parent)` edges written to the relationship store.
    pub edges_restored: Vec<(TabId, TabId)>,
    pub edges_dropped: usize,
    /// Whether the snapshot was removed from the store afterwards.
    pub snapshot_removed: bool,
}

impl RestoreOutcome {
    /// New identity of a snapshot tab, if it was recreated.
    pub fn new_id(&self, original: TabId) -> Option<TabId> {
        self.mapping.get(&original).copied()
    }
}

pub struct SnapshotRestorer {
    browser: Arc<dyn BrowserAdapter>,
    relationships: RelationshipStore,
    snapshots: SnapshotStore,
    blank_url: String,
}

impl SnapshotRestorer {
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
            blank_url: config.blank_url.clone(),
        }
    }

    /// Recreates the snapshot at `index` in a new window and removes it from the store.
    ///
    /// Fails without side effects if `index` is out of range or the window
    /// cannot be created.
    pub async fn restore(&self, index: usize) -> Result<RestoreOutcome, TabkeepError> {
        let snapshot = self.snapshots.get(index).await?.ok_or_else(|| {
            TabkeepError::Validation(format!("no inactive window at index {index}"))
        })?;

        let first = snapshot.tabs.first();
        let created = self
            .browser
            .create_window(CreateWindow {
                url: Some(first.map_or_else(|| self.blank_url.clone(), |t| t.url.clone())),
                focused: true,
            })
            .await?;
        let window_id = created.window.id;
        debug!(window_id = %window_id, tabs = snapshot.tabs.len(), "restore window created");

        let mut outcome = RestoreOutcome {
            window_id: Some(window_id),
            ..RestoreOutcome::default()
        };

        if let Some(first) = first {
            match created.tabs.first() {
                Some(seed) => {
                    outcome.mapping.insert(first.original_id, seed.id);
                    if first.pinned {
                        self.pin_seed(seed.id).await;
                    }
                }
                None => outcome.failed_tabs.push(FailedTab {
                    original_id: first.original_id,
                    url: first.url.clone(),
                    error: "host created the window without a seed tab".into(),
                }),
            }
        }

        for tab in snapshot.tabs.iter().skip(1) {
            match self.browser.create_tab(create_props(window_id, tab)).await {
                Ok(new_tab) => {
                    outcome.mapping.insert(tab.original_id, new_tab.id);
                }
                Err(e) => {
                    warn!(original_id = %tab.original_id, error = %e, "failed to restore tab");
                    outcome.failed_tabs.push(FailedTab {
                        original_id: tab.original_id,
                        url: tab.url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let (edges, dropped) = remap_edges(&snapshot.tabs, &outcome.mapping);
        outcome.edges_dropped = dropped;
        match self.relationships.record_children(&edges).await {
            Ok(_) => outcome.edges_restored = edges,
            Err(e) => warn!(window_id = %window_id, error = %e, "restored tabs but not their relationships"),
        }

        outcome.snapshot_removed = self.remove_restored(&snapshot).await;
        info!(
            window_id = %window_id,
            restored = outcome.mapping.len(),
            failed = outcome.failed_tabs.len(),
            edges = outcome.edges_restored.len(),
            "window reactivated"
        );
        Ok(outcome)
    }

    /// Pinning cannot be requested at window creation, so it is applied afterwards.
    async fn pin_seed(&self, seed: TabId) {
        let update = TabUpdate {
            pinned: Some(true),
            ..TabUpdate::default()
        };
        if let Err(e) = self.browser.update_tab(seed, update).await {
            debug!(tab_id = %seed, error = %e, "could not pin restored seed tab");
        }
    }

    async fn remove_restored(&self, snapshot: &WindowSnapshot) -> bool {
        match self.snapshots.remove_capture(snapshot).await {
            Ok(true) => true,
            Ok(false) => {
                debug!(window_id = %snapshot.id, "restored snapshot already gone from store");
                false
            }
            Err(e) => {
                warn!(window_id = %snapshot.id, error = %e, "restored snapshot could not be removed");
                false
            }
        }
    }
}

fn create_props(window_id: WindowId, tab: &TabSnapshot) -> CreateTab {
    CreateTab {
        window_id,
        url: tab.url.clone(),
        pinned: tab.pinned,
        index: Some(tab.index),
        active: false,
    }
}

/// Translates snapshot edges through `mapping`.
///
/// An edge survives only if both endpoints were recreated. Returns the new
/// edges and the number dropped.
pub fn remap_edges(
    tabs: &[TabSnapshot],
    mapping: &BTreeMap<TabId, TabId>,
) -> (Vec<(TabId, TabId)>, usize) {
    let mut edges = Vec::new();
    let mut dropped = 0;
    for tab in tabs {
        let Some(parent) = tab.parent_tab_id else {
            continue;
        };
        match (mapping.get(&tab.original_id), mapping.get(&parent)) {
            (Some(&child), Some(&parent)) => edges.push((child, parent)),
            _ => dropped += 1,
        }
    }
    (edges, dropped)
}
