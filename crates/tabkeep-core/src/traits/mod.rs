// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the host collaborator surface.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod browser;
pub mod bus;
pub mod storage;

pub use adapter::PluginAdapter;
pub use browser::BrowserAdapter;
pub use bus::MessageBusAdapter;
pub use storage::StorageAdapter;
