// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response surface used by the extension front end.
//!
//! Requests are JSON objects tagged by `action`. Explicit user actions report
//! failures through `{ success: false, error }`; background enrichment such
//! as queue annotations silently degrades instead.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tabkeep_config::TabkeepConfig;
use tabkeep_core::types::{QueueItem, Tab, TabUpdate, WindowSnapshot};
use tabkeep_core::{
    BrowserAdapter, MessageBusAdapter, StorageAdapter, TabId, TabkeepError, WindowId,
};
use tabkeep_storage::Repositories;

use crate::capture::SnapshotCapture;
use crate::codec::{self, ImportResult};
use crate::lifecycle::{LifecycleHandler, notify_tabs_updated};
use crate::queue_cache::{QueueCache, QueueLookup};
use crate::relationships::RelationshipStore;
use crate::restore::{RestoreOutcome, SnapshotRestorer};
use crate::snapshots::SnapshotStore;
use crate::tree::build_forest;

/// A front-end request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    GetTabs,
    RestoreQueue { tab_id: TabId, url: String },
    DeactivateWindow { window_id: WindowId },
    ReactivateWindow { index: usize },
    GetInactiveWindows,
    ExportInactiveWindows,
    ImportInactiveWindows { json_string: String },
    RenameInactiveWindow { index: usize, name: String },
    DeleteInactiveWindow { index: usize },
}

/// `{ success, error? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// A live tab as shown in the tab list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabView {
    #[serde(flatten)]
    pub tab: Tab,
    /// Nesting level under its opener within the same window.
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<Vec<QueueItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restored: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Tabs {
        tabs: Vec<TabView>,
    },
    InactiveWindows {
        #[serde(rename = "inactiveWindows")]
        inactive_windows: Vec<WindowSnapshot>,
    },
    Export {
        success: bool,
        data: String,
    },
    Import(ImportResult),
    Action(ActionResult),
}

impl From<ActionResult> for Response {
    fn from(result: ActionResult) -> Self {
        Response::Action(result)
    }
}

/// Owns the session stores and answers front-end requests.
pub struct SessionService {
    browser: Arc<dyn BrowserAdapter>,
    bus: Arc<dyn MessageBusAdapter>,
    relationships: RelationshipStore,
    queues: QueueCache,
    snapshots: SnapshotStore,
    capture: SnapshotCapture,
    restorer: SnapshotRestorer,
    lifecycle: Arc<LifecycleHandler>,
}

impl SessionService {
    pub fn new(
        browser: Arc<dyn BrowserAdapter>,
        storage: Arc<dyn StorageAdapter>,
        bus: Arc<dyn MessageBusAdapter>,
        config: &TabkeepConfig,
    ) -> Self {
        let repos = Repositories::new(storage);
        let relationships = RelationshipStore::new(&repos);
        let queues = QueueCache::new(&repos, &config.queue);
        let snapshots = SnapshotStore::new(&repos);
        let capture = SnapshotCapture::new(
            Arc::clone(&browser),
            relationships.clone(),
            snapshots.clone(),
            &config.snapshot,
        );
        let restorer = SnapshotRestorer::new(
            Arc::clone(&browser),
            relationships.clone(),
            snapshots.clone(),
            &config.snapshot,
        );
        let lifecycle = Arc::new(LifecycleHandler::new(
            Arc::clone(&browser),
            Arc::clone(&bus),
            relationships.clone(),
            queues.clone(),
        ));
        Self {
            browser,
            bus,
            relationships,
            queues,
            snapshots,
            capture,
            restorer,
            lifecycle,
        }
    }

    pub fn relationships(&self) -> &RelationshipStore {
        &self.relationships
    }

    pub fn queues(&self) -> &QueueCache {
        &self.queues
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn lifecycle(&self) -> Arc<LifecycleHandler> {
        Arc::clone(&self.lifecycle)
    }

    /// Decodes a JSON request, handles it and encodes the response.
    pub async fn handle_json(&self, text: &str) -> serde_json::Value {
        let response = match serde_json::from_str::<Request>(text) {
            Ok(request) => self.handle(request).await,
            Err(e) => ActionResult::failed(format!("invalid request: {e}")).into(),
        };
        serde_json::to_value(&response).unwrap_or_else(|e| {
            serde_json::json!({ "success": false, "error": format!("response encoding failed: {e}") })
        })
    }

    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::GetTabs => match self.tabs().await {
                Ok(tabs) => Response::Tabs { tabs },
                Err(e) => ActionResult::failed(e).into(),
            },
            Request::RestoreQueue { tab_id, url } => match self.restore_queue(tab_id, &url).await {
                Ok(_) => ActionResult::ok().into(),
                Err(e) => ActionResult::failed(e).into(),
            },
            Request::DeactivateWindow { window_id } => outcome(
                self.deactivate_window(window_id).await,
                "No tabs found in window",
            ),
            Request::ReactivateWindow { index } => match self.reactivate_window(index).await {
                Ok(_) => ActionResult::ok().into(),
                Err(e) => ActionResult::failed(e).into(),
            },
            Request::GetInactiveWindows => match self.snapshots.list().await {
                Ok(inactive_windows) => Response::InactiveWindows { inactive_windows },
                Err(e) => ActionResult::failed(e).into(),
            },
            Request::ExportInactiveWindows => match codec::export(&self.snapshots).await {
                Ok(data) => Response::Export {
                    success: true,
                    data,
                },
                Err(e) => ActionResult::failed(e).into(),
            },
            Request::ImportInactiveWindows { json_string } => {
                Response::Import(codec::import(&self.snapshots, &json_string).await)
            }
            Request::RenameInactiveWindow { index, name } => outcome(
                self.snapshots.rename(index, &name).await,
                "Inactive window not found",
            ),
            Request::DeleteInactiveWindow { index } => outcome(
                self.snapshots.delete(index).await,
                "Inactive window not found",
            ),
        }
    }

    /// Live tabs grouped by window, each window in tree order.
    pub async fn tabs(&self) -> Result<Vec<TabView>, TabkeepError> {
        let tabs = self.browser.query_tabs().await?;
        let edges = self.relationships.edges().await.unwrap_or_else(|e| {
            warn!(error = %e, "relationships unavailable, listing flat");
            Vec::new()
        });
        let lookups = self.queues.lookup_many(&tabs).await.unwrap_or_else(|e| {
            warn!(error = %e, "queue cache unavailable, listing without queues");
            vec![None; tabs.len()]
        });

        let mut by_window: BTreeMap<WindowId, Vec<(Tab, Option<QueueLookup>)>> = BTreeMap::new();
        for (tab, lookup) in tabs.into_iter().zip(lookups) {
            by_window.entry(tab.window_id).or_default().push((tab, lookup));
        }

        let mut views = Vec::new();
        for (_, entries) in by_window {
            let window_tabs: Vec<Tab> = entries.iter().map(|(t, _)| t.clone()).collect();
            let forest = build_forest(&window_tabs, &edges);
            let mut entries: BTreeMap<TabId, (Tab, Option<QueueLookup>)> =
                entries.into_iter().map(|(t, l)| (t.id, (t, l))).collect();
            for node in forest.order {
                let Some((tab, lookup)) = entries.remove(&node.id) else {
                    continue;
                };
                views.push(TabView {
                    tab,
                    depth: node.depth,
                    restored: lookup.as_ref().map(|l| l.restored),
                    queue: lookup.map(|l| l.record.items),
                });
            }
        }
        Ok(views)
    }

    /// Navigates `tab_id` to `url` and re-seeds its queue from the canonical cache.
    pub async fn restore_queue(&self, tab_id: TabId, url: &str) -> Result<bool, TabkeepError> {
        let update = TabUpdate {
            url: Some(url.to_string()),
            ..TabUpdate::default()
        };
        self.browser.update_tab(tab_id, update).await?;
        let seeded = self.queues.reseed(tab_id, url).await.unwrap_or_else(|e| {
            warn!(tab_id = %tab_id, error = %e, "queue not re-seeded");
            false
        });
        debug!(tab_id = %tab_id, seeded, "queue restored");
        Ok(seeded)
    }

    pub async fn deactivate_window(&self, window_id: WindowId) -> Result<bool, TabkeepError> {
        let captured = self.capture.capture(window_id).await?;
        if captured {
            notify_tabs_updated(self.bus.as_ref()).await;
        }
        Ok(captured)
    }

    pub async fn reactivate_window(&self, index: usize) -> Result<RestoreOutcome, TabkeepError> {
        let outcome = self.restorer.restore(index).await?;
        if !outcome.failed_tabs.is_empty() {
            info!(failed = outcome.failed_tabs.len(), "window partially reactivated");
        }
        notify_tabs_updated(self.bus.as_ref()).await;
        Ok(outcome)
    }
}

fn outcome(result: Result<bool, TabkeepError>, when_false: &str) -> Response {
    match result {
        Ok(true) => ActionResult::ok(),
        Ok(false) => ActionResult::failed(when_false),
        Err(e) => ActionResult::failed(e),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tabkeep_storage::MemoryStorage;
    use tabkeep_test_utils::{MockBrowser, MockBus};

    use super::*;

    struct Fixture {
        browser: Arc<MockBrowser>,
        bus: Arc<MockBus>,
        service: SessionService,
    }

    fn fixture() -> Fixture {
        let browser = Arc::new(MockBrowser::new());
        let bus = Arc::new(MockBus::new());
        let service = SessionService::new(
            browser.clone(),
            Arc::new(MemoryStorage::new()),
            bus.clone(),
            &TabkeepConfig::default(),
        );
        Fixture {
            browser,
            bus,
            service,
        }
    }

    #[test]
    fn requests_decode_from_action_tagged_json() {
        let request: Request =
            serde_json::from_value(json!({"action": "restoreQueue", "tabId": 4, "url": "u"})).unwrap();
        assert_eq!(
            request,
            Request::RestoreQueue {
                tab_id: TabId(4),
                url: "u".into()
            }
        );
        let request: Request =
            serde_json::from_value(json!({"action": "importInactiveWindows", "jsonString": "{}"}))
                .unwrap();
        assert!(matches!(request, Request::ImportInactiveWindows { .. }));
    }

    #[tokio::test]
    async fn unknown_action_is_reported() {
        let f = fixture();
        let response = f.service.handle_json(r#"{"action": "explode"}"#).await;
        assert_eq!(response["success"], json!(false));
        assert!(response["error"].as_str().unwrap().starts_with("invalid request"));
    }

    #[tokio::test]
    async fn get_tabs_nests_children_under_openers() {
        let f = fixture();
        let w = f.browser.open_window().await;
        let parent = f.browser.open_tab(w, "https://a.test/", None).await;
        let other = f.browser.open_tab(w, "https://c.test/", None).await;
        let child = f.browser.open_tab(w, "https://b.test/", Some(parent.id)).await;
        f.service.relationships().record_child(child.id, parent.id).await.unwrap();

        let response = f.service.handle_json(r#"{"action": "getTabs"}"#).await;
        let tabs = response["tabs"].as_array().unwrap();
        let order: Vec<(i64, u64)> = tabs
            .iter()
            .map(|t| (t["id"].as_i64().unwrap(), t["depth"].as_u64().unwrap()))
            .collect();
        assert_eq!(order, vec![(parent.id.0, 0), (child.id.0, 1), (other.id.0, 0)]);
        assert!(tabs[0].get("queue").is_none());
        assert_eq!(tabs[0]["windowId"], json!(w.0));
    }

    #[tokio::test]
    async fn deactivate_and_reactivate_round_trip() {
        let f = fixture();
        let w = f.browser.open_window().await;
        f.browser.open_tab(w, "https://a.test/", None).await;

        let response = f
            .service
            .handle(Request::DeactivateWindow { window_id: w })
            .await;
        assert_eq!(response, Response::Action(ActionResult::ok()));
        let Response::InactiveWindows { inactive_windows } =
            f.service.handle(Request::GetInactiveWindows).await
        else {
            panic!("expected inactive windows");
        };
        assert_eq!(inactive_windows.len(), 1);

        let response = f.service.handle(Request::ReactivateWindow { index: 0 }).await;
        assert_eq!(response, Response::Action(ActionResult::ok()));
        assert_eq!(f.browser.tabs().await[0].url, "https://a.test/");
        assert!(f.service.snapshots().list().await.unwrap().is_empty());
        assert_eq!(f.bus.sent_count().await, 2);
    }

    #[tokio::test]
    async fn failures_surface_as_error_strings() {
        let f = fixture();
        let w = f.browser.open_window().await;
        let deactivate = f.service.handle(Request::DeactivateWindow { window_id: w }).await;
        assert_eq!(
            deactivate,
            Response::Action(ActionResult::failed("No tabs found in window"))
        );

        let reactivate = f.service.handle(Request::ReactivateWindow { index: 2 }).await;
        let Response::Action(result) = reactivate else {
            panic!("expected action result");
        };
        assert!(!result.success);
        assert!(result.error.unwrap().contains("index 2"));

        let restore = f
            .service
            .handle(Request::RestoreQueue {
                tab_id: TabId(999),
                url: "https://x.test/".into(),
            })
            .await;
        assert_eq!(restore, Response::Action(ActionResult::failed("tab 999 not found")));
    }

    #[tokio::test]
    async fn restore_without_cached_queue_still_succeeds() {
        let f = fixture();
        let w = f.browser.open_window().await;
        let tab = f.browser.open_tab(w, "https://a.test/", None).await;

        let response = f
            .service
            .handle(Request::RestoreQueue {
                tab_id: tab.id,
                url: "https://www.youtube.com/watch?v=abc&list=PL1".into(),
            })
            .await;
        assert_eq!(response, Response::Action(ActionResult::ok()));
        assert_eq!(f.browser.updates().await.len(), 1);
    }

    #[tokio::test]
    async fn export_and_import_through_requests() {
        let f = fixture();
        let Response::Export { success, data } =
            f.service.handle(Request::ExportInactiveWindows).await
        else {
            panic!("expected export");
        };
        assert!(success);

        let response = f
            .service
            .handle(Request::ImportInactiveWindows { json_string: data })
            .await;
        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded, json!({"success": true, "message": "Imported 0 window(s)", "count": 0}));
    }

    #[tokio::test]
    async fn rename_and_delete_requests() {
        let f = fixture();
        let w = f.browser.open_window().await;
        f.browser.open_tab(w, "https://a.test/", None).await;
        f.service.deactivate_window(w).await.unwrap();

        let renamed = f
            .service
            .handle(Request::RenameInactiveWindow {
                index: 0,
                name: "Reading".into(),
            })
            .await;
        assert_eq!(renamed, Response::Action(ActionResult::ok()));
        assert_eq!(f.service.snapshots().get(0).await.unwrap().unwrap().name, "Reading");

        let missing = f.service.handle(Request::DeleteInactiveWindow { index: 5 }).await;
        assert_eq!(missing, Response::Action(ActionResult::failed("Inactive window not found")));
        let deleted = f.service.handle(Request::DeleteInactiveWindow { index: 0 }).await;
        assert_eq!(deleted, Response::Action(ActionResult::ok()));
    }
}
