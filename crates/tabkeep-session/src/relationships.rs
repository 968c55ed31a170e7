// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted child → parent opener edges between live tabs.
//!
//! The store knows nothing about windows: it records true opener
//! relationships only, and an edge lives exactly as long as its child tab.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::Utc;
use tracing::debug;

use tabkeep_core::types::{RelationshipEdge, RelationshipEntry};
use tabkeep_core::{TabId, TabkeepError};
use tabkeep_storage::{Repositories, Repository};

use crate::RELATIONSHIPS_KEY;

/// Persisted form: child id (decimal string key) to its parent entry.
pub type RelationshipMap = BTreeMap<TabId, RelationshipEntry>;

#[derive(Clone)]
pub struct RelationshipStore {
    repo: Repository<RelationshipMap>,
}

impl RelationshipStore {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            repo: repos.repository(RELATIONSHIPS_KEY),
        }
    }

    /// Records `parent` as the opener of `child`, replacing any earlier parent.
    ///
    /// Returns `false` for a self-edge, which is never stored.
    pub async fn record_child(&self, child: TabId, parent: TabId) -> Result<bool, TabkeepError> {
        self.record_children(&[(child, parent)]).await.map(|n| n == 1)
    }

    /// Records several `(child, parent)` edges in one write. Returns how many were stored.
    pub async fn record_children(&self, edges: &[(TabId, TabId)]) -> Result<usize, TabkeepError> {
        let now = Utc::now();
        self.repo
            .update(|map| {
                let mut stored = 0;
                for &(child, parent) in edges {
                    if child == parent {
                        debug!(tab_id = %child, "ignoring self-parenting edge");
                        continue;
                    }
                    map.insert(
                        child,
                        RelationshipEntry {
                            parent_id: parent,
                            created_at: now,
                        },
                    );
                    stored += 1;
                }
                stored
            })
            .await
    }

    /// Drops the edge owned by `child`. Returns whether one existed.
    pub async fn forget(&self, child: TabId) -> Result<bool, TabkeepError> {
        let removed = self
            .repo
            .modify(|map| map.remove(&child).map(|_| ()))
            .await?;
        Ok(removed.is_some())
    }

    /// Drops every edge whose child is not in `live`. Returns how many were dropped.
    pub async fn retain_live(&self, live: &HashSet<TabId>) -> Result<usize, TabkeepError> {
        let dropped = self
            .repo
            .modify(|map| {
                let before = map.len();
                map.retain(|child, _| live.contains(child));
                let dropped = before - map.len();
                (dropped > 0).then_some(dropped)
            })
            .await?;
        Ok(dropped.unwrap_or(0))
    }

    pub async fn parent_of(&self, child: TabId) -> Result<Option<TabId>, TabkeepError> {
        Ok(self.repo.load().await?.get(&child).map(|e| e.parent_id))
    }

    pub async fn children_of(&self, parent: TabId) -> Result<BTreeSet<TabId>, TabkeepError> {
        Ok(self
            .repo
            .load()
            .await?
            .into_iter()
            .filter(|(_, entry)| entry.parent_id == parent)
            .map(|(child, _)| child)
            .collect())
    }

    /// Every stored edge, ordered by child id.
    pub async fn edges(&self) -> Result<Vec<RelationshipEdge>, TabkeepError> {
        Ok(self
            .repo
            .load()
            .await?
            .into_iter()
            .map(|(child, entry)| RelationshipEdge {
                child,
                parent: entry.parent_id,
                created_at: entry.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tabkeep_core::StorageAdapter;
    use tabkeep_storage::MemoryStorage;

    use super::*;

    fn store() -> (RelationshipStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let repos = Repositories::new(storage.clone());
        (RelationshipStore::new(&repos), storage)
    }

    #[tokio::test]
    async fn record_child_overwrites_prior_parent() {
        let (store, _) = store();
        store.record_child(TabId(2), TabId(1)).await.unwrap();
        store.record_child(TabId(2), TabId(5)).await.unwrap();
        assert_eq!(store.parent_of(TabId(2)).await.unwrap(), Some(TabId(5)));
        assert!(store.children_of(TabId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn children_share_a_parent() {
        let (store, _) = store();
        store
            .record_children(&[(TabId(2), TabId(1)), (TabId(3), TabId(1))])
            .await
            .unwrap();
        let children: Vec<TabId> = store.children_of(TabId(1)).await.unwrap().into_iter().collect();
        assert_eq!(children, vec![TabId(2), TabId(3)]);
        assert_eq!(store.edges().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn forget_is_idempotent() {
        let (store, storage) = store();
        store.record_child(TabId(2), TabId(1)).await.unwrap();
        assert!(store.forget(TabId(2)).await.unwrap());
        let after_first = storage.snapshot().await;
        assert!(!store.forget(TabId(2)).await.unwrap());
        assert!(!store.forget(TabId(99)).await.unwrap());
        assert_eq!(storage.snapshot().await, after_first);
    }

    #[tokio::test]
    async fn self_parenting_is_ignored() {
        let (store, _) = store();
        assert!(!store.record_child(TabId(4), TabId(4)).await.unwrap());
        assert_eq!(store.parent_of(TabId(4)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn persisted_as_string_keyed_map() {
        let (store, storage) = store();
        store.record_child(TabId(12), TabId(7)).await.unwrap();
        let stored = storage.get(&[RELATIONSHIPS_KEY]).await.unwrap();
        let entry = &stored[RELATIONSHIPS_KEY]["12"];
        assert_eq!(entry["parentId"], json!(7));
        assert!(entry["createdAt"].is_i64());
    }

    #[tokio::test]
    async fn retain_live_drops_edges_of_closed_children() {
        let (store, _) = store();
        store
            .record_children(&[(TabId(2), TabId(1)), (TabId(3), TabId(1))])
            .await
            .unwrap();
        let live = HashSet::from([TabId(1), TabId(3)]);
        assert_eq!(store.retain_live(&live).await.unwrap(), 1);
        assert_eq!(store.parent_of(TabId(2)).await.unwrap(), None);
        assert_eq!(store.retain_live(&live).await.unwrap(), 0);
    }
}
