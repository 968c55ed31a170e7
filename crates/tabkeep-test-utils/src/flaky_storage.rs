// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage wrapper with switchable write failures.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use tabkeep_core::{AdapterType, HealthStatus, PluginAdapter, StorageAdapter, TabkeepError};
use tabkeep_storage::MemoryStorage;

/// Delegates to an inner [`MemoryStorage`], failing `set`/`remove` while
/// writes are disabled. Reads always succeed.
pub struct FlakyStorage {
    inner: Arc<MemoryStorage>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::wrap(Arc::new(MemoryStorage::new()))
    }

    pub fn wrap(inner: Arc<MemoryStorage>) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &Arc<MemoryStorage> {
        &self.inner
    }

    fn check_write(&self) -> Result<(), TabkeepError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TabkeepError::Storage {
                source: "injected write failure".into(),
            });
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for FlakyStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for FlakyStorage {
    fn name(&self) -> &str {
        "flaky-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TabkeepError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Degraded("writes failing".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl StorageAdapter for FlakyStorage {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, TabkeepError> {
        self.inner.get(keys).await
    }

    async fn set(&self, entries: HashMap<String, Value>) -> Result<(), TabkeepError> {
        self.check_write()?;
        self.inner.set(entries).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), TabkeepError> {
        self.check_write()?;
        self.inner.remove(keys).await
    }

    async fn keys(&self) -> Result<Vec<String>, TabkeepError> {
        self.inner.keys().await
    }
}
