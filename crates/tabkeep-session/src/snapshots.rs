// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The persisted list of deactivated windows, most recent first.

use tracing::info;

use tabkeep_core::TabkeepError;
use tabkeep_core::types::WindowSnapshot;
use tabkeep_storage::{Repositories, Repository};

use crate::INACTIVE_WINDOWS_KEY;

#[derive(Clone)]
pub struct SnapshotStore {
    repo: Repository<Vec<WindowSnapshot>>,
}

impl SnapshotStore {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            repo: repos.repository(INACTIVE_WINDOWS_KEY),
        }
    }

    pub async fn list(&self) -> Result<Vec<WindowSnapshot>, TabkeepError> {
        self.repo.load().await
    }

    pub async fn get(&self, index: usize) -> Result<Option<WindowSnapshot>, TabkeepError> {
        Ok(self.repo.load().await?.into_iter().nth(index))
    }

    /// Inserts `snapshot` at the front and returns the new store length.
    pub async fn prepend(&self, snapshot: WindowSnapshot) -> Result<usize, TabkeepError> {
        self.repo
            .update(|list| {
                list.insert(0, snapshot);
                list.len()
            })
            .await
    }

    /// Appends `snapshots` after the existing entries and returns how many were added.
    pub async fn append_all(&self, snapshots: Vec<WindowSnapshot>) -> Result<usize, TabkeepError> {
        let added = snapshots.len();
        if added == 0 {
            return Ok(0);
        }
        self.repo.update(|list| list.extend(snapshots)).await?;
        Ok(added)
    }

    /// Removes the entry describing the same capture as `snapshot`, wherever it now sits.
    pub async fn remove_capture(&self, snapshot: &WindowSnapshot) -> Result<bool, TabkeepError> {
        let removed = self
            .repo
            .modify(|list| {
                let pos = list.iter().position(|s| s.same_capture(snapshot))?;
                Some(list.remove(pos))
            })
            .await?;
        Ok(removed.is_some())
    }

    /// Renames the snapshot at `index`. Returns `false` if out of range.
    pub async fn rename(&self, index: usize, name: &str) -> Result<bool, TabkeepError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TabkeepError::Validation("window name must not be empty".into()));
        }
        let renamed = self
            .repo
            .modify(|list| {
                let snapshot = list.get_mut(index)?;
                snapshot.name = name.to_string();
                Some(())
            })
            .await?;
        if renamed.is_some() {
            info!(index, name, "inactive window renamed");
        }
        Ok(renamed.is_some())
    }

    /// Deletes the snapshot at `index`. Returns `false` if out of range.
    pub async fn delete(&self, index: usize) -> Result<bool, TabkeepError> {
        let removed = self
            .repo
            .modify(|list| (index < list.len()).then(|| list.remove(index)))
            .await?;
        if let Some(snapshot) = &removed {
            info!(index, window_id = %snapshot.id, tabs = snapshot.tabs.len(), "inactive window deleted");
        }
        Ok(removed.is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tabkeep_storage::MemoryStorage;
    use tabkeep_test_utils::fixtures::{tab_snapshot, window_snapshot};

    use super::*;

    fn store() -> SnapshotStore {
        SnapshotStore::new(&Repositories::new(Arc::new(MemoryStorage::new())))
    }

    #[tokio::test]
    async fn prepend_keeps_most_recent_first() {
        let store = store();
        store.prepend(window_snapshot(1, 1_000, vec![])).await.unwrap();
        let len = store.prepend(window_snapshot(2, 2_000, vec![])).await.unwrap();
        assert_eq!(len, 2);
        let ids: Vec<i64> = store.list().await.unwrap().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn remove_capture_survives_index_shift() {
        let store = store();
        let target = window_snapshot(1, 1_000, vec![tab_snapshot(10, 0, None)]);
        store.prepend(target.clone()).await.unwrap();
        store.prepend(window_snapshot(2, 2_000, vec![])).await.unwrap();

        assert!(store.remove_capture(&target).await.unwrap());
        let ids: Vec<i64> = store.list().await.unwrap().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![2]);
        assert!(!store.remove_capture(&target).await.unwrap());
    }

    #[tokio::test]
    async fn same_window_id_different_capture_is_kept() {
        let store = store();
        let older = window_snapshot(1, 1_000, vec![]);
        store.prepend(older.clone()).await.unwrap();
        store.prepend(window_snapshot(1, 5_000, vec![])).await.unwrap();
        assert!(store.remove_capture(&older).await.unwrap());
        assert_eq!(store.list().await.unwrap()[0].deactivated_at.timestamp_millis(), 5_000);
    }

    #[tokio::test]
    async fn rename_and_delete_respect_bounds() {
        let store = store();
        store.prepend(window_snapshot(1, 1_000, vec![])).await.unwrap();

        assert!(store.rename(0, "  Research ").await.unwrap());
        assert_eq!(store.get(0).await.unwrap().unwrap().name, "Research");
        assert!(!store.rename(3, "x").await.unwrap());
        assert!(store.rename(0, "   ").await.is_err());

        assert!(!store.delete(1).await.unwrap());
        assert!(store.delete(0).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_all_keeps_existing_entries_first() {
        let store = store();
        store.prepend(window_snapshot(1, 1_000, vec![])).await.unwrap();
        let added = store
            .append_all(vec![window_snapshot(7, 7_000, vec![]), window_snapshot(8, 8_000, vec![])])
            .await
            .unwrap();
        assert_eq!(added, 2);
        let ids: Vec<i64> = store.list().await.unwrap().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![1, 7, 8]);
    }
}
