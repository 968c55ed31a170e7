// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tabkeep session subsystem.

use thiserror::Error;

/// The primary error type used across all Tabkeep adapter traits and core operations.
#[derive(Debug, Error)]
pub enum TabkeepError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A persisted value could not be encoded or decoded.
    #[error("serialization error for `{key}`: {source}")]
    Serialization {
        key: String,
        source: serde_json::Error,
    },

    /// The host no longer knows the tab or window (closed, navigated away).
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// A bus message had nobody listening on the other end.
    #[error("no receiver for message `{0}`")]
    NoReceiver(String),

    /// Any other failure reported by the browser host.
    #[error("host error: {message}")]
    Host { message: String },

    /// Caller-supplied input was rejected before any mutation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TabkeepError {
    /// Shorthand for a missing tab.
    pub fn tab_not_found(id: i64) -> Self {
        Self::NotFound { kind: "tab", id }
    }

    /// Shorthand for a missing window.
    pub fn window_not_found(id: i64) -> Self {
        Self::NotFound { kind: "window", id }
    }

    /// Errors expected under concurrency, which callers skip rather than surface.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoReceiver(_))
    }
}
