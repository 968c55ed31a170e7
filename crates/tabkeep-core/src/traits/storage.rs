// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value storage adapter trait for persistence backends.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TabkeepError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for asynchronous key-value persistence.
///
/// Mirrors the host's extension storage: whole JSON values per top-level key,
/// no transactions and no schema. Absent keys are simply missing from the
/// returned map.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Reads the given keys.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, TabkeepError>;

    /// Writes every entry, replacing existing values.
    async fn set(&self, entries: HashMap<String, Value>) -> Result<(), TabkeepError>;

    /// Deletes the given keys. Missing keys are ignored.
    async fn remove(&self, keys: &[&str]) -> Result<(), TabkeepError>;

    /// Lists every stored key.
    async fn keys(&self) -> Result<Vec<String>, TabkeepError>;
}
