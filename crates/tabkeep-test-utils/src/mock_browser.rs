// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock browser host for deterministic testing.
//!
//! `MockBrowser` keeps windows and tabs in memory, issues fresh identities the
//! way a real host does, and lets tests inject failures into tab creation,
//! window creation and script injection.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, Notify};

use tabkeep_core::types::{
    CreateTab, CreateWindow, CreatedWindow, GROUP_ID_NONE, ScriptKind, Tab, TabStatus, TabUpdate,
    Window,
};
use tabkeep_core::{
    AdapterType, BrowserAdapter, HealthStatus, PluginAdapter, StorageAdapter, TabId, TabkeepError,
    WindowId,
};

/// What `inject_script` returns for a tab.
#[derive(Debug, Clone)]
pub enum ScriptResult {
    Value(Value),
    /// The tab vanished while the script ran.
    TabGone,
    HostError(String),
    /// Returns the value once the gate is released.
    Gated(Value, ScriptGate),
}

/// Holds an injection open so a test can interleave other work with it.
#[derive(Debug, Clone, Default)]
pub struct ScriptGate {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl ScriptGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once a gated injection is running.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct State {
    windows: BTreeMap<WindowId, Window>,
    tabs: BTreeMap<TabId, Tab>,
    next_tab_id: i64,
    next_window_id: i64,
    create_tab_calls: usize,
    failing_create_tab_calls: HashSet<usize>,
    fail_create_window: bool,
    scripts: HashMap<TabId, ScriptResult>,
    removed_windows: Vec<WindowId>,
    store_lengths_at_remove: Vec<usize>,
    updates: Vec<(TabId, TabUpdate)>,
}

impl State {
    fn issue_tab_id(&mut self) -> TabId {
        self.next_tab_id += 1;
        TabId(self.next_tab_id)
    }

    fn issue_window_id(&mut self) -> WindowId {
        self.next_window_id += 1;
        WindowId(self.next_window_id)
    }

    fn window_len(&self, window_id: WindowId) -> u32 {
        let count = self
            .tabs
            .values()
            .filter(|t| t.window_id == window_id)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Inserts `tab` at `tab.index`, shifting later tabs right.
    fn insert_tab(&mut self, mut tab: Tab) -> Tab {
        let len = self.window_len(tab.window_id);
        tab.index = tab.index.min(len);
        for other in self.tabs.values_mut() {
            if other.window_id == tab.window_id && other.index >= tab.index {
                other.index += 1;
            }
        }
        self.tabs.insert(tab.id, tab.clone());
        tab
    }

    fn remove_tab(&mut self, tab_id: TabId) -> Option<Tab> {
        let tab = self.tabs.remove(&tab_id)?;
        for other in self.tabs.values_mut() {
            if other.window_id == tab.window_id && other.index > tab.index {
                other.index -= 1;
            }
        }
        Some(tab)
    }

    fn new_tab(&mut self, window_id: WindowId, url: &str, index: u32) -> Tab {
        let id = self.issue_tab_id();
        Tab {
            id,
            window_id,
            index,
            url: url.to_string(),
            title: String::new(),
            fav_icon_url: None,
            pinned: false,
            active: false,
            group_id: GROUP_ID_NONE,
            opener_tab_id: None,
            status: TabStatus::Complete,
        }
    }
}

/// An in-memory browser host.
pub struct MockBrowser {
    state: Mutex<State>,
    store_watch: Option<(Arc<dyn StorageAdapter>, &'static str)>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_tab_id: 100,
                ..State::default()
            }),
            store_watch: None,
        }
    }

    /// Records the length of the JSON array under `key` whenever a window is
    /// removed, before the removal takes effect.
    pub fn with_store_watch(mut self, storage: Arc<dyn StorageAdapter>, key: &'static str) -> Self {
        self.store_watch = Some((storage, key));
        self
    }

    /// Opens a window with no tabs.
    pub async fn open_window(&self) -> WindowId {
        let mut state = self.state.lock().await;
        let id = state.issue_window_id();
        state.windows.insert(id, Window { id, focused: false });
        id
    }

    /// Appends a tab to `window_id`.
    pub async fn open_tab(&self, window_id: WindowId, url: &str, opener: Option<TabId>) -> Tab {
        let mut state = self.state.lock().await;
        let index = state.window_len(window_id);
        let mut tab = state.new_tab(window_id, url, index);
        tab.title = format!("Tab at {url}");
        tab.opener_tab_id = opener;
        state.insert_tab(tab)
    }

    /// Changes a tab's URL without going through `update_tab`.
    pub async fn navigate(&self, tab_id: TabId, url: &str) -> Option<Tab> {
        let mut state = self.state.lock().await;
        let tab = state.tabs.get_mut(&tab_id)?;
        tab.url = url.to_string();
        Some(tab.clone())
    }

    pub async fn close_tab(&self, tab_id: TabId) -> Option<Tab> {
        self.state.lock().await.remove_tab(tab_id)
    }

    /// Every live tab ordered by window and index.
    pub async fn tabs(&self) -> Vec<Tab> {
        let state = self.state.lock().await;
        let mut tabs: Vec<Tab> = state.tabs.values().cloned().collect();
        tabs.sort_by_key(|t| (t.window_id, t.index));
        tabs
    }

    pub async fn window_ids(&self) -> Vec<WindowId> {
        self.state.lock().await.windows.keys().copied().collect()
    }

    /// Makes the `n`th call to `create_tab` (1-based) fail.
    pub async fn fail_nth_create_tab(&self, n: usize) {
        self.state.lock().await.failing_create_tab_calls.insert(n);
    }

    pub async fn fail_create_window(&self, fail: bool) {
        self.state.lock().await.fail_create_window = fail;
    }

    pub async fn set_script_result(&self, tab_id: TabId, result: ScriptResult) {
        self.state.lock().await.scripts.insert(tab_id, result);
    }

    pub async fn create_tab_calls(&self) -> usize {
        self.state.lock().await.create_tab_calls
    }

    pub async fn removed_windows(&self) -> Vec<WindowId> {
        self.state.lock().await.removed_windows.clone()
    }

    /// Store lengths observed by the store watch, one per `remove_window` call.
    pub async fn store_lengths_at_remove(&self) -> Vec<usize> {
        self.state.lock().await.store_lengths_at_remove.clone()
    }

    pub async fn updates(&self) -> Vec<(TabId, TabUpdate)> {
        self.state.lock().await.updates.clone()
    }

    async fn watched_store_len(&self) -> Result<Option<usize>, TabkeepError> {
        let Some((storage, key)) = &self.store_watch else {
            return Ok(None);
        };
        let values = storage.get(&[key]).await?;
        let len = values
            .get(*key)
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        Ok(Some(len))
    }
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockBrowser {
    fn name(&self) -> &str {
        "mock-browser"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Browser
    }

    async fn health_check(&self) -> Result<HealthStatus, TabkeepError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl BrowserAdapter for MockBrowser {
    async fn query_tabs(&self) -> Result<Vec<Tab>, TabkeepError> {
        Ok(self.tabs().await)
    }

    async fn query_window_tabs(&self, window_id: WindowId) -> Result<Vec<Tab>, TabkeepError> {
        Ok(self
            .tabs()
            .await
            .into_iter()
            .filter(|t| t.window_id == window_id)
            .collect())
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<Tab, TabkeepError> {
        self.state
            .lock()
            .await
            .tabs
            .get(&tab_id)
            .cloned()
            .ok_or_else(|| TabkeepError::tab_not_found(tab_id.0))
    }

    async fn create_tab(&self, props: CreateTab) -> Result<Tab, TabkeepError> {
        let mut state = self.state.lock().await;
        state.create_tab_calls += 1;
        let call = state.create_tab_calls;
        if state.failing_create_tab_calls.contains(&call) {
            return Err(TabkeepError::Host {
                message: format!("injected failure on create_tab call {call}"),
            });
        }
        if !state.windows.contains_key(&props.window_id) {
            return Err(TabkeepError::window_not_found(props.window_id.0));
        }
        let index = props
            .index
            .unwrap_or_else(|| state.window_len(props.window_id));
        let mut tab = state.new_tab(props.window_id, &props.url, index);
        tab.pinned = props.pinned;
        tab.active = props.active;
        Ok(state.insert_tab(tab))
    }

    async fn update_tab(&self, tab_id: TabId, update: TabUpdate) -> Result<Tab, TabkeepError> {
        let mut state = self.state.lock().await;
        state.updates.push((tab_id, update.clone()));
        let tab = state
            .tabs
            .get_mut(&tab_id)
            .ok_or_else(|| TabkeepError::tab_not_found(tab_id.0))?;
        if let Some(url) = update.url {
            tab.url = url;
        }
        if let Some(pinned) = update.pinned {
            tab.pinned = pinned;
        }
        if let Some(active) = update.active {
            tab.active = active;
        }
        Ok(tab.clone())
    }

    async fn remove_tab(&self, tab_id: TabId) -> Result<(), TabkeepError> {
        self.close_tab(tab_id)
            .await
            .map(|_| ())
            .ok_or_else(|| TabkeepError::tab_not_found(tab_id.0))
    }

    async fn list_windows(&self) -> Result<Vec<Window>, TabkeepError> {
        Ok(self.state.lock().await.windows.values().cloned().collect())
    }

    async fn create_window(&self, props: CreateWindow) -> Result<CreatedWindow, TabkeepError> {
        let mut state = self.state.lock().await;
        if state.fail_create_window {
            return Err(TabkeepError::Host {
                message: "injected create_window failure".into(),
            });
        }
        let id = state.issue_window_id();
        let window = Window {
            id,
            focused: props.focused,
        };
        state.windows.insert(id, window.clone());
        let url = props.url.as_deref().unwrap_or("about:blank");
        let mut seed = state.new_tab(id, url, 0);
        seed.active = true;
        let seed = state.insert_tab(seed);
        Ok(CreatedWindow {
            window,
            tabs: vec![seed],
        })
    }

    async fn remove_window(&self, window_id: WindowId) -> Result<(), TabkeepError> {
        if !self.state.lock().await.windows.contains_key(&window_id) {
            return Err(TabkeepError::window_not_found(window_id.0));
        }
        let observed = self.watched_store_len().await?;

        let mut state = self.state.lock().await;
        state.windows.remove(&window_id);
        state.tabs.retain(|_, t| t.window_id != window_id);
        state.removed_windows.push(window_id);
        if let Some(len) = observed {
            state.store_lengths_at_remove.push(len);
        }
        Ok(())
    }

    async fn inject_script(&self, tab_id: TabId, script: ScriptKind) -> Result<Value, TabkeepError> {
        let scripted = {
            let state = self.state.lock().await;
            if !state.tabs.contains_key(&tab_id) {
                return Err(TabkeepError::tab_not_found(tab_id.0));
            }
            state.scripts.get(&tab_id).cloned()
        };
        match (script, scripted) {
            (ScriptKind::ExtractQueue, None) => Ok(Value::Array(Vec::new())),
            (ScriptKind::ExtractQueue, Some(ScriptResult::Value(v))) => Ok(v),
            (ScriptKind::ExtractQueue, Some(ScriptResult::TabGone)) => {
                Err(TabkeepError::tab_not_found(tab_id.0))
            }
            (ScriptKind::ExtractQueue, Some(ScriptResult::HostError(message))) => {
                Err(TabkeepError::Host { message })
            }
            (ScriptKind::ExtractQueue, Some(ScriptResult::Gated(v, gate))) => {
                gate.started.notify_one();
                gate.release.notified().await;
                Ok(v)
            }
        }
    }
}
