// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tabkeep export` and `tabkeep import` command implementations.

use std::path::Path;

use tracing::info;

use tabkeep_core::TabkeepError;
use tabkeep_session::SnapshotStore;
use tabkeep_session::codec;

/// Write the export document to `output`, or stdout when none is given.
pub async fn run_export(store: &SnapshotStore, output: Option<&Path>) -> Result<(), TabkeepError> {
    let data = codec::export(store).await?;
    match output {
        Some(path) => {
            std::fs::write(path, data).map_err(|e| {
                TabkeepError::Internal(format!("failed to write {}: {e}", path.display()))
            })?;
            info!(path = %path.display(), "export written");
        }
        None => println!("{data}"),
    }
    Ok(())
}

/// Import windows from `file`. A rejected document is reported as an error.
pub async fn run_import(store: &SnapshotStore, file: &Path) -> Result<(), TabkeepError> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| TabkeepError::Internal(format!("failed to read {}: {e}", file.display())))?;
    let result = codec::import(store, &text).await;
    if !result.success {
        return Err(TabkeepError::Validation(result.message));
    }
    println!("{}", result.message);
    Ok(())
}
