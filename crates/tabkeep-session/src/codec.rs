// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Portable JSON import/export of inactive windows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use tabkeep_core::TabkeepError;
use tabkeep_core::types::WindowSnapshot;

use crate::INACTIVE_WINDOWS_KEY;
use crate::snapshots::SnapshotStore;

/// Version stamped into exported documents.
pub const EXPORT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The exported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub inactive_windows: Vec<WindowSnapshot>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

/// Outcome of an import, reported to the caller rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub success: bool,
    pub message: String,
    pub count: usize,
}

impl ImportResult {
    fn rejected(message: String) -> Self {
        warn!(%message, "import rejected");
        Self {
            success: false,
            message,
            count: 0,
        }
    }
}

/// Serializes the whole store as a pretty-printed document.
pub async fn export(store: &SnapshotStore) -> Result<String, TabkeepError> {
    let document = ExportDocument {
        inactive_windows: store.list().await?,
        exported_at: Utc::now(),
        version: EXPORT_VERSION.to_string(),
    };
    serde_json::to_string_pretty(&document).map_err(|source| TabkeepError::Serialization {
        key: INACTIVE_WINDOWS_KEY.to_string(),
        source,
    })
}

/// Validates `text` and appends its windows to the store.
///
/// Nothing is written unless the whole document is valid.
pub async fn import(store: &SnapshotStore, text: &str) -> ImportResult {
    let windows = match parse_document(text) {
        Ok(windows) => windows,
        Err(message) => return ImportResult::rejected(message),
    };
    match store.append_all(windows).await {
        Ok(count) => {
            info!(count, "inactive windows imported");
            ImportResult {
                success: true,
                message: format!("Imported {count} window(s)"),
                count,
            }
        }
        Err(e) => ImportResult::rejected(format!("Failed to save imported windows: {e}")),
    }
}

/// Checks the document shape and decodes every window, or describes the first problem.
pub fn parse_document(text: &str) -> Result<Vec<WindowSnapshot>, String> {
    let document: Value =
        serde_json::from_str(text).map_err(|e| format!("Invalid JSON: {e}"))?;
    let Some(object) = document.as_object() else {
        return Err("Invalid format: expected a JSON object".to_string());
    };
    let Some(windows) = object.get("inactiveWindows").and_then(Value::as_array) else {
        return Err("Invalid format: missing inactiveWindows array".to_string());
    };
    windows
        .iter()
        .enumerate()
        .map(|(i, window)| {
            WindowSnapshot::deserialize(window)
                .map_err(|e| format!("Invalid window at position {i}: {e}"))
        })
        .collect()
}
