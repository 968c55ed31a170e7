// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use std::collections::HashMap;

use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use tabkeep_config::model::StorageConfig;
use tabkeep_core::{
    AdapterType, HealthStatus, PluginAdapter, StorageAdapter, TabkeepError,
};

use crate::database::{Database, map_tr_err};

/// SQLite-backed key-value storage.
///
/// Each top-level key is one row holding a JSON document. The database is
/// opened lazily by [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, TabkeepError> {
        let storage = Self::new(config);
        storage.initialize().await?;
        Ok(storage)
    }

    /// Opens the database at the configured path and runs migrations.
    pub async fn initialize(&self) -> Result<(), TabkeepError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| TabkeepError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Flushes the WAL into the main database file.
    pub async fn close(&self) -> Result<(), TabkeepError> {
        self.db()?.checkpoint().await
    }

    fn db(&self) -> Result<&Database, TabkeepError> {
        self.db.get().ok_or_else(|| TabkeepError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TabkeepError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, TabkeepError> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let rows = self
            .db()?
            .connection()
            .call(move |conn| -> Result<Vec<(String, String)>, rusqlite::Error> {
                let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1")?;
                let mut rows = Vec::with_capacity(keys.len());
                for key in keys {
                    let value: Option<String> =
                        stmt.query_row(params![key], |row| row.get(0)).optional()?;
                    if let Some(value) = value {
                        rows.push((key, value));
                    }
                }
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;

        rows.into_iter()
            .map(|(key, raw)| match serde_json::from_str(&raw) {
                Ok(value) => Ok((key, value)),
                Err(source) => Err(TabkeepError::Serialization { key, source }),
            })
            .collect()
    }

    async fn set(&self, entries: HashMap<String, Value>) -> Result<(), TabkeepError> {
        let rows: Vec<(String, String)> = entries
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        self.db()?
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO kv_store (key, value, updated_at)
                         VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                         ON CONFLICT(key) DO UPDATE SET
                             value = excluded.value,
                             updated_at = excluded.updated_at",
                    )?;
                    for (key, value) in &rows {
                        stmt.execute(params![key, value])?;
                    }
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), TabkeepError> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        self.db()?
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                for key in &keys {
                    tx.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn keys(&self) -> Result<Vec<String>, TabkeepError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
                let keys = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn uninitialized_storage_reports_unhealthy() {
        let storage = SqliteStorage::new(make_config("/nonexistent/never-opened.db"));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
        assert!(matches!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
        assert!(storage.get(&["a"]).await.is_err());
    }

    #[tokio::test]
    async fn set_then_get_returns_only_present_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kv.db");
        let storage = SqliteStorage::open(make_config(path.to_str().unwrap()))
            .await
            .unwrap();

        let mut entries = HashMap::new();
        entries.insert("inactiveWindows".to_string(), json!([{"name": "w"}]));
        storage.set(entries).await.unwrap();

        let got = storage.get(&["inactiveWindows", "missing"]).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got["inactiveWindows"], json!([{"name": "w"}]));
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn set_overwrites_and_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kv.db");
        let storage = SqliteStorage::open(make_config(path.to_str().unwrap()))
            .await
            .unwrap();

        for value in [json!(1), json!(2)] {
            storage
                .set(HashMap::from([("k".to_string(), value)]))
                .await
                .unwrap();
        }
        assert_eq!(storage.get(&["k"]).await.unwrap()["k"], json!(2));

        storage.remove(&["k"]).await.unwrap();
        storage.remove(&["k"]).await.unwrap();
        assert!(storage.get(&["k"]).await.unwrap().is_empty());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("durable.db");
        let path = path.to_str().unwrap();
        {
            let storage = SqliteStorage::open(make_config(path)).await.unwrap();
            storage
                .set(HashMap::from([("tabRelationships".to_string(), json!({"5": 1}))]))
                .await
                .unwrap();
            storage.close().await.unwrap();
        }
        let storage = SqliteStorage::open(make_config(path)).await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["tabRelationships"]);
    }

    #[tokio::test]
    async fn double_initialize_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("once.db");
        let storage = SqliteStorage::open(make_config(path.to_str().unwrap()))
            .await
            .unwrap();
        assert!(storage.initialize().await.is_err());
    }
}
