// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue cache with session and canonical keys.
//!
//! Every captured queue is stored twice in one persisted map: under the
//! session key `tab-<id>`, which dies with the tab, and under the page's
//! canonical URL, which survives tab closure and browser restarts. Canonical
//! records are bounded by age and count.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use tabkeep_config::model::QueueConfig;
use tabkeep_core::types::{QueueItem, QueueRecord, Tab};
use tabkeep_core::{TabId, TabkeepError};
use tabkeep_storage::{Repositories, Repository};

use crate::QUEUES_KEY;
use crate::canonical::{QueueInfo, QueueParams, canonicalize};

const SESSION_KEY_PREFIX: &str = "tab-";

/// Persisted form: session or canonical key to record.
pub type QueueMap = BTreeMap<String, QueueRecord>;

/// Ephemeral cache key of a live tab.
pub fn session_key(tab_id: TabId) -> String {
    format!("{SESSION_KEY_PREFIX}{tab_id}")
}

fn session_tab_id(key: &str) -> Option<TabId> {
    key.strip_prefix(SESSION_KEY_PREFIX)?.parse().ok().map(TabId)
}

/// A cached queue resolved for a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueLookup {
    pub record: QueueRecord,
    /// Found only through the canonical key, so it predates this tab.
    pub restored: bool,
}

/// Bounds applied to canonical-keyed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    pub max_entries: usize,
    pub ttl: Option<Duration>,
}

impl EvictionPolicy {
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            max_entries: config.max_entries,
            ttl: (config.ttl_days > 0).then(|| Duration::days(i64::from(config.ttl_days))),
        }
    }

    /// Removes expired canonical records, then the oldest ones beyond capacity.
    ///
    /// Session records are left alone. Returns how many records were removed.
    pub fn apply(&self, map: &mut QueueMap, now: DateTime<Utc>) -> usize {
        let before = map.len();
        if let Some(ttl) = self.ttl {
            let cutoff = now - ttl;
            map.retain(|key, record| session_tab_id(key).is_some() || record.captured_at >= cutoff);
        }

        let mut canonical: Vec<(DateTime<Utc>, String)> = map
            .iter()
            .filter(|(key, _)| session_tab_id(key).is_none())
            .map(|(key, record)| (record.captured_at, key.clone()))
            .collect();
        if canonical.len() > self.max_entries {
            canonical.sort();
            let excess = canonical.len() - self.max_entries;
            for (_, key) in canonical.into_iter().take(excess) {
                map.remove(&key);
            }
        }
        before - map.len()
    }
}

#[derive(Clone)]
pub struct QueueCache {
    repo: Repository<QueueMap>,
    params: QueueParams,
    policy: EvictionPolicy,
}

impl QueueCache {
    pub fn new(repos: &Repositories, config: &QueueConfig) -> Self {
        Self {
            repo: repos.repository(QUEUES_KEY),
            params: QueueParams::from_config(config),
            policy: EvictionPolicy::from_config(config),
        }
    }

    pub fn params(&self) -> &QueueParams {
        &self.params
    }

    /// Stores `items` under both keys. An empty queue is "no queue" and is not stored.
    pub async fn capture(
        &self,
        tab_id: TabId,
        info: &QueueInfo,
        items: Vec<QueueItem>,
    ) -> Result<bool, TabkeepError> {
        self.store(Some(tab_id), info, items).await
    }

    /// Stores `items` under the canonical key only, for a tab that is no longer
    /// on the page the queue was read from.
    pub async fn capture_canonical(
        &self,
        info: &QueueInfo,
        items: Vec<QueueItem>,
    ) -> Result<bool, TabkeepError> {
        self.store(None, info, items).await
    }

    async fn store(
        &self,
        tab_id: Option<TabId>,
        info: &QueueInfo,
        items: Vec<QueueItem>,
    ) -> Result<bool, TabkeepError> {
        if items.is_empty() {
            return Ok(false);
        }
        let now = Utc::now();
        let record = QueueRecord {
            owner_url: info.canonical.to_string(),
            items,
            captured_at: now,
        };
        let count = record.items.len();
        let policy = self.policy;
        let evicted = self
            .repo
            .update(|map| {
                if let Some(tab_id) = tab_id {
                    map.insert(session_key(tab_id), record.clone());
                }
                map.insert(info.canonical.to_string(), record);
                policy.apply(map, now)
            })
            .await?;
        debug!(
            tab_id = ?tab_id.map(|id| id.0),
            canonical = %info.canonical,
            items = count,
            evicted,
            "queue captured"
        );
        Ok(true)
    }

    /// The queue for `tab`: its session record, else the canonical record of its URL.
    pub async fn lookup(&self, tab: &Tab) -> Result<Option<QueueLookup>, TabkeepError> {
        let map = self.repo.load().await?;
        Ok(resolve(&map, tab, &self.params))
    }

    /// Like [`lookup`](Self::lookup) for many tabs with a single read.
    pub async fn lookup_many(&self, tabs: &[Tab]) -> Result<Vec<Option<QueueLookup>>, TabkeepError> {
        let map = self.repo.load().await?;
        Ok(tabs.iter().map(|tab| resolve(&map, tab, &self.params)).collect())
    }

    /// Folds the session record of a closing tab into its canonical record.
    ///
    /// The more recently captured record wins. Returns whether a session record existed.
    pub async fn migrate_on_close(&self, tab_id: TabId) -> Result<bool, TabkeepError> {
        let policy = self.policy;
        let now = Utc::now();
        let migrated = self
            .repo
            .modify(|map| {
                let record = map.remove(&session_key(tab_id))?;
                let key = record.owner_url.clone();
                let newer = map
                    .get(&key)
                    .is_none_or(|existing| record.captured_at >= existing.captured_at);
                if newer {
                    map.insert(key, record);
                }
                policy.apply(map, now);
                Some(newer)
            })
            .await?;
        if let Some(newer) = migrated {
            debug!(tab_id = %tab_id, replaced_canonical = newer, "session queue migrated");
        }
        Ok(migrated.is_some())
    }

    /// Seeds the session key of `tab_id` from the canonical record of `url`.
    pub async fn reseed(&self, tab_id: TabId, url: &str) -> Result<bool, TabkeepError> {
        let Some(key) = canonicalize(url, &self.params) else {
            return Ok(false);
        };
        let seeded = self
            .repo
            .modify(|map| {
                let record = map.get(key.as_str())?.clone();
                map.insert(session_key(tab_id), record);
                Some(())
            })
            .await?;
        Ok(seeded.is_some())
    }

    /// Runs eviction now. Returns how many canonical records were dropped.
    pub async fn prune(&self) -> Result<usize, TabkeepError> {
        let policy = self.policy;
        let now = Utc::now();
        let evicted = self
            .repo
            .modify(|map| {
                let evicted = policy.apply(map, now);
                (evicted > 0).then_some(evicted)
            })
            .await?
            .unwrap_or(0);
        info!(evicted, "queue cache pruned");
        Ok(evicted)
    }

    /// Deletes session records whose tab is not in `live`.
    ///
    /// Orphans are migrated to their canonical key first so nothing captured is lost.
    pub async fn sweep_orphans(&self, live: &HashSet<TabId>) -> Result<usize, TabkeepError> {
        let policy = self.policy;
        let now = Utc::now();
        let swept = self
            .repo
            .modify(|map| {
                let orphans: Vec<String> = map
                    .keys()
                    .filter(|key| session_tab_id(key).is_some_and(|id| !live.contains(&id)))
                    .cloned()
                    .collect();
                if orphans.is_empty() {
                    return None;
                }
                for key in &orphans {
                    let Some(record) = map.remove(key) else {
                        continue;
                    };
                    let canonical = record.owner_url.clone();
                    if map
                        .get(&canonical)
                        .is_none_or(|existing| record.captured_at > existing.captured_at)
                    {
                        map.insert(canonical, record);
                    }
                }
                policy.apply(map, now);
                Some(orphans.len())
            })
            .await?
            .unwrap_or(0);
        if swept > 0 {
            debug!(swept, "orphaned session queues swept");
        }
        Ok(swept)
    }

    /// Number of canonical and session records currently stored.
    pub async fn counts(&self) -> Result<(usize, usize), TabkeepError> {
        let map = self.repo.load().await?;
        let sessions = map.keys().filter(|k| session_tab_id(k).is_some()).count();
        Ok((map.len() - sessions, sessions))
    }
}

fn resolve(map: &QueueMap, tab: &Tab, params: &QueueParams) -> Option<QueueLookup> {
    if let Some(record) = map.get(&session_key(tab.id)) {
        return Some(QueueLookup {
            record: record.clone(),
            restored: false,
        });
    }
    let key = canonicalize(&tab.url, params)?;
    map.get(key.as_str()).map(|record| QueueLookup {
        record: record.clone(),
        restored: true,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tabkeep_storage::MemoryStorage;
    use tabkeep_test_utils::fixtures;

    use super::*;
    use crate::canonical::queue_info;

    fn config() -> QueueConfig {
        QueueConfig::default()
    }

    fn cache_with(config: &QueueConfig) -> QueueCache {
        let repos = Repositories::new(Arc::new(MemoryStorage::new()));
        QueueCache::new(&repos, config)
    }

    fn items(ids: &[&str]) -> Vec<QueueItem> {
        ids.iter()
            .map(|id| QueueItem {
                item_id: id.to_string(),
                title: format!("Video {id}"),
                url: format!("https://www.youtube.com/watch?v={id}&list=L"),
            })
            .collect()
    }

    fn record_at(owner: &str, millis: i64) -> QueueRecord {
        QueueRecord {
            owner_url: owner.to_string(),
            items: items(&["a"]),
            captured_at: DateTime::from_timestamp_millis(millis).unwrap(),
        }
    }

    fn tab_at(id: i64, url: &str) -> Tab {
        let mut tab = fixtures::tab(id, 1, 0);
        tab.url = url.to_string();
        tab
    }

    #[test]
    fn session_keys_round_trip() {
        assert_eq!(session_key(TabId(42)), "tab-42");
        assert_eq!(session_tab_id("tab-42"), Some(TabId(42)));
        assert_eq!(session_tab_id("https://h.test/?v=1&list=2"), None);
        assert_eq!(session_tab_id("tab-x"), None);
    }

    #[test]
    fn eviction_drops_expired_then_oldest_canonical() {
        let policy = EvictionPolicy {
            max_entries: 2,
            ttl: Some(Duration::days(1)),
        };
        let now = DateTime::from_timestamp_millis(10 * 86_400_000).unwrap();
        let day = 86_400_000;
        let mut map = QueueMap::from([
            ("https://a/".to_string(), record_at("https://a/", 10 * day - 10)),
            ("https://b/".to_string(), record_at("https://b/", 10 * day - 20)),
            ("https://c/".to_string(), record_at("https://c/", 10 * day - 30)),
            ("https://old/".to_string(), record_at("https://old/", 2 * day)),
            ("tab-1".to_string(), record_at("https://old/", 0)),
        ]);
        assert_eq!(policy.apply(&mut map, now), 2);
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["https://a/", "https://b/", "tab-1"]);
    }

    #[tokio::test]
    async fn lookup_prefers_session_record() {
        let cache = cache_with(&config());
        let url = "https://www.youtube.com/watch?v=X&list=Y&index=3";
        let info = queue_info(url, cache.params()).unwrap();
        assert!(cache.capture(TabId(5), &info, items(&["X", "Z"])).await.unwrap());

        let found = cache.lookup(&tab_at(5, url)).await.unwrap().unwrap();
        assert!(!found.restored);
        assert_eq!(found.record.items.len(), 2);
    }

    #[tokio::test]
    async fn empty_capture_is_not_stored() {
        let cache = cache_with(&config());
        let info = queue_info("https://h.test/w?v=1&list=2", cache.params()).unwrap();
        assert!(!cache.capture(TabId(1), &info, Vec::new()).await.unwrap());
        assert_eq!(cache.counts().await.unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn closed_tab_queue_is_restored_for_another_position() {
        let cache = cache_with(&config());
        let first = "https://www.youtube.com/watch?v=X&list=Y&index=3";
        let info = queue_info(first, cache.params()).unwrap();
        cache.capture(TabId(5), &info, items(&["X", "Z"])).await.unwrap();
        assert!(cache.migrate_on_close(TabId(5)).await.unwrap());
        assert_eq!(cache.counts().await.unwrap(), (1, 0));

        let later = tab_at(77, "https://www.youtube.com/watch?v=X&list=Y&index=9");
        let found = cache.lookup(&later).await.unwrap().unwrap();
        assert!(found.restored);
        assert_eq!(found.record.items, items(&["X", "Z"]));
    }

    #[tokio::test]
    async fn migrate_without_session_record_is_noop() {
        let cache = cache_with(&config());
        assert!(!cache.migrate_on_close(TabId(3)).await.unwrap());
    }

    #[tokio::test]
    async fn reseed_copies_canonical_into_session_key() {
        let cache = cache_with(&config());
        let url = "https://www.youtube.com/watch?v=X&list=Y";
        let info = queue_info(url, cache.params()).unwrap();
        cache.capture(TabId(5), &info, items(&["X"])).await.unwrap();
        cache.migrate_on_close(TabId(5)).await.unwrap();

        assert!(cache.reseed(TabId(8), &format!("{url}&index=4")).await.unwrap());
        let found = cache.lookup(&tab_at(8, "about:blank")).await.unwrap().unwrap();
        assert!(!found.restored);
        assert!(!cache.reseed(TabId(9), "https://h.test/nothing").await.unwrap());
    }

    #[tokio::test]
    async fn capacity_bound_applies_on_capture() {
        let cache = cache_with(&QueueConfig {
            max_entries: 1,
            ..config()
        });
        for (tab, v) in [(1, "a"), (2, "b")] {
            let info = queue_info(&format!("https://h.test/w?v={v}&list=L"), cache.params()).unwrap();
            cache.capture(TabId(tab), &info, items(&[v])).await.unwrap();
        }
        assert_eq!(cache.counts().await.unwrap(), (1, 2));
    }

    #[tokio::test]
    async fn sweep_orphans_migrates_and_removes_dead_sessions() {
        let cache = cache_with(&config());
        for (tab, v) in [(1, "a"), (2, "b")] {
            let info = queue_info(&format!("https://h.test/w?v={v}&list=L"), cache.params()).unwrap();
            cache.capture(TabId(tab), &info, items(&[v])).await.unwrap();
        }
        let swept = cache.sweep_orphans(&HashSet::from([TabId(2)])).await.unwrap();
        assert_eq!(swept, 1);
        assert_eq!(cache.counts().await.unwrap(), (2, 1));
        assert_eq!(cache.sweep_orphans(&HashSet::from([TabId(2)])).await.unwrap(), 0);
    }
}
