// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed repositories over top-level storage keys.
//!
//! The backing store only offers whole-value `get`/`set`, so every
//! read-modify-write of a key must go through that key's writer lock.
//! [`Repositories`] hands out one lock per key; all [`Repository`] handles for
//! the same key share it.
//!
//! **Do NOT call `StorageAdapter::set` for a repository key directly.**

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use tabkeep_core::{StorageAdapter, TabkeepError};

/// Registry of per-key writer locks over one storage backend.
pub struct Repositories {
    storage: Arc<dyn StorageAdapter>,
    locks: Mutex<HashMap<&'static str, Arc<AsyncMutex<()>>>>,
}

impl Repositories {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            storage,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying storage backend.
    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    /// Typed handle on `key`. Handles for the same key serialize their writes.
    pub fn repository<T>(&self, key: &'static str) -> Repository<T> {
        let lock = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default()
            .clone();
        Repository {
            key,
            storage: Arc::clone(&self.storage),
            lock,
            _value: PhantomData,
        }
    }
}

/// A single JSON value stored under one key, decoded as `T`.
pub struct Repository<T> {
    key: &'static str,
    storage: Arc<dyn StorageAdapter>,
    lock: Arc<AsyncMutex<()>>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            storage: Arc::clone(&self.storage),
            lock: Arc::clone(&self.lock),
            _value: PhantomData,
        }
    }
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Default + Send,
{
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Reads the current value, or `T::default()` when the key is absent.
    ///
    /// A value that exists but does not decode is an error, never a reset.
    pub async fn load(&self) -> Result<T, TabkeepError> {
        let mut found = self.storage.get(&[self.key]).await?;
        match found.remove(self.key) {
            None | Some(serde_json::Value::Null) => Ok(T::default()),
            Some(raw) => serde_json::from_value(raw).map_err(|source| {
                warn!(key = self.key, error = %source, "stored value does not decode");
                TabkeepError::Serialization {
                    key: self.key.to_string(),
                    source,
                }
            }),
        }
    }

    /// Replaces the stored value.
    pub async fn save(&self, value: &T) -> Result<(), TabkeepError> {
        let _guard = self.lock.lock().await;
        self.write(value).await
    }

    /// Loads, applies `f` and writes the result back, all under the writer lock.
    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, TabkeepError> {
        let _guard = self.lock.lock().await;
        let mut value = self.load().await?;
        let out = f(&mut value);
        self.write(&value).await?;
        Ok(out)
    }

    /// Like [`update`](Self::update) but only writes when `f` returns `Some`.
    pub async fn modify<R>(
        &self,
        f: impl FnOnce(&mut T) -> Option<R>,
    ) -> Result<Option<R>, TabkeepError> {
        let _guard = self.lock.lock().await;
        let mut value = self.load().await?;
        let Some(out) = f(&mut value) else {
            return Ok(None);
        };
        self.write(&value).await?;
        Ok(Some(out))
    }

    /// Deletes the key entirely.
    pub async fn clear(&self) -> Result<(), TabkeepError> {
        let _guard = self.lock.lock().await;
        self.storage.remove(&[self.key]).await
    }

    async fn write(&self, value: &T) -> Result<(), TabkeepError> {
        let encoded = serde_json::to_value(value).map_err(|source| TabkeepError::Serialization {
            key: self.key.to_string(),
            source,
        })?;
        self.storage
            .set(HashMap::from([(self.key.to_string(), encoded)]))
            .await?;
        debug!(key = self.key, "repository value written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn repos() -> Repositories {
        Repositories::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn absent_key_loads_default() {
        let repo = repos().repository::<Vec<String>>("things");
        assert!(repo.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn undecodable_value_is_an_error() {
        let repos = repos();
        repos
            .storage()
            .set(HashMap::from([("things".to_string(), json!({"not": "a list"}))]))
            .await
            .unwrap();
        let err = repos
            .repository::<Vec<String>>("things")
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, TabkeepError::Serialization { ref key, .. } if key == "things"));
    }

    #[tokio::test]
    async fn modify_returning_none_skips_write() {
        let repos = repos();
        let repo = repos.repository::<Vec<u32>>("nums");
        let out = repo.modify(|_| None::<()>).await.unwrap();
        assert!(out.is_none());
        assert!(repos.storage().keys().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_are_not_lost() {
        let repos = repos();
        let mut tasks = Vec::new();
        for i in 0..32u32 {
            let repo = repos.repository::<BTreeMap<String, u32>>("counters");
            tasks.push(tokio::spawn(async move {
                repo.update(|map| {
                    map.insert(i.to_string(), i);
                })
                .await
                .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        let map = repos
            .repository::<BTreeMap<String, u32>>("counters")
            .load()
            .await
            .unwrap();
        assert_eq!(map.len(), 32);
    }

    #[tokio::test]
    async fn clear_removes_key() {
        let repos = repos();
        let repo = repos.repository::<Vec<u32>>("nums");
        repo.save(&vec![1, 2]).await.unwrap();
        repo.clear().await.unwrap();
        assert!(repo.load().await.unwrap().is_empty());
    }
}
