// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Browser host adapter: tabs, windows and script injection.

use async_trait::async_trait;

use crate::error::TabkeepError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    CreateTab, CreateWindow, CreatedWindow, ScriptKind, Tab, TabId, TabUpdate, Window, WindowId,
};

/// Adapter over the host browser's tab and window APIs.
///
/// Every call is a suspension point and may fail. A tab or window that no
/// longer exists must be reported as [`TabkeepError::NotFound`] so callers
/// can skip it instead of surfacing an error.
#[async_trait]
pub trait BrowserAdapter: PluginAdapter {
    /// Lists every live tab across all windows.
    async fn query_tabs(&self) -> Result<Vec<Tab>, TabkeepError>;

    /// Lists the live tabs of one window.
    async fn query_window_tabs(&self, window_id: WindowId) -> Result<Vec<Tab>, TabkeepError>;

    /// Fetches a single tab.
    async fn get_tab(&self, tab_id: TabId) -> Result<Tab, TabkeepError>;

    /// Creates a tab in an existing window and returns it with its new identity.
    async fn create_tab(&self, props: CreateTab) -> Result<Tab, TabkeepError>;

    /// Applies attribute changes to a tab.
    async fn update_tab(&self, tab_id: TabId, update: TabUpdate) -> Result<Tab, TabkeepError>;

    /// Closes a tab.
    async fn remove_tab(&self, tab_id: TabId) -> Result<(), TabkeepError>;

    /// Lists every open window.
    async fn list_windows(&self) -> Result<Vec<Window>, TabkeepError>;

    /// Opens a new window with a seed tab.
    async fn create_window(&self, props: CreateWindow) -> Result<CreatedWindow, TabkeepError>;

    /// Closes a window and all of its tabs.
    async fn remove_window(&self, window_id: WindowId) -> Result<(), TabkeepError>;

    /// Runs a script in the tab's page context and returns its single result.
    async fn inject_script(
        &self,
        tab_id: TabId,
        script: ScriptKind,
    ) -> Result<serde_json::Value, TabkeepError>;
}
