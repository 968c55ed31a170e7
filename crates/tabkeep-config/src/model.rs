// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tabkeep session subsystem.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Tabkeep configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TabkeepConfig {
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Queue extraction cache settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Window snapshot settings.
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Lifecycle event bus settings.
    #[serde(default)]
    pub bus: BusConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tabkeep").join("tabkeep.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tabkeep.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Queue extraction cache configuration.
///
/// The parameter names decide which pages are queue-bearing and what the
/// canonical cache key keeps.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Query parameter naming the primary item of the page.
    #[serde(default = "default_item_param")]
    pub item_param: String,

    /// Query parameter naming the collection the item belongs to.
    #[serde(default = "default_collection_param")]
    pub collection_param: String,

    /// Maximum number of canonical-keyed records kept.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Canonical-keyed records older than this are evicted. `0` disables the TTL.
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            item_param: default_item_param(),
            collection_param: default_collection_param(),
            max_entries: default_max_entries(),
            ttl_days: default_ttl_days(),
        }
    }
}

fn default_item_param() -> String {
    "v".to_string()
}

fn default_collection_param() -> String {
    "list".to_string()
}

fn default_max_entries() -> usize {
    500
}

fn default_ttl_days() -> u32 {
    90
}

/// Window snapshot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotConfig {
    /// Name given to a freshly captured window.
    ///
    /// `{count}` expands to the number of tabs and `{title}` to the first tab's title.
    #[serde(default = "default_snapshot_name")]
    pub default_name: String,

    /// URL used for the seed tab when restoring a snapshot without tabs.
    #[serde(default = "default_blank_url")]
    pub blank_url: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            default_name: default_snapshot_name(),
            blank_url: default_blank_url(),
        }
    }
}

fn default_snapshot_name() -> String {
    "{title} (+{count} tabs)".to_string()
}

fn default_blank_url() -> String {
    "about:blank".to_string()
}

/// Lifecycle event bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Events buffered per subscriber before lagging subscribers drop events.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_event_capacity() -> usize {
    256
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a_playlist_style_queue() {
        let config = TabkeepConfig::default();
        assert_eq!(config.queue.item_param, "v");
        assert_eq!(config.queue.collection_param, "list");
        assert_eq!(config.queue.max_entries, 500);
        assert_eq!(config.snapshot.blank_url, "about:blank");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: TabkeepConfig = toml::from_str(
            r#"
[queue]
max_entries = 20
"#,
        )
        .unwrap();
        assert_eq!(config.queue.max_entries, 20);
        assert_eq!(config.queue.ttl_days, 90);
        assert!(config.storage.wal_mode);
    }

    #[test]
    fn unknown_snapshot_key_is_rejected() {
        let result = toml::from_str::<TabkeepConfig>(
            r#"
[snapshot]
defualt_name = "x"
"#,
        );
        assert!(result.is_err());
    }
}
