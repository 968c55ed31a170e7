// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tabkeep integration tests.
//!
//! Provides mock host adapters for fast, deterministic tests without a real
//! browser.
//!
//! # Components
//!
//! - [`MockBrowser`] - In-memory tab and window host with injectable failures
//! - [`MockBus`] - Message bus that records sends or reports no receiver
//! - [`FlakyStorage`] - Storage wrapper whose writes can be made to fail
//! - [`fixtures`] - Builders for tabs and snapshots

pub mod fixtures;
pub mod flaky_storage;
pub mod mock_browser;
pub mod mock_bus;

pub use flaky_storage::FlakyStorage;
pub use mock_browser::{MockBrowser, ScriptGate, ScriptResult};
pub use mock_bus::MockBus;
