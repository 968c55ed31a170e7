// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tabkeep session subsystem.
//!
//! This crate provides the trait definitions for the host collaborators
//! (browser, storage, message bus), the shared error type, and the domain
//! types that are persisted by the session stores.

pub mod error;
pub mod traits;
pub mod types;

pub use error::TabkeepError;
pub use types::{AdapterType, HealthStatus, TabId, WindowId};

pub use traits::{BrowserAdapter, MessageBusAdapter, PluginAdapter, StorageAdapter};
