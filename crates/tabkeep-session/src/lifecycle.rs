// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reacts to browser lifecycle events to keep relationships and queues current.
//!
//! Each event is handled in its own task, so handlers for different events
//! interleave at storage and host calls. Every store mutation is a locked
//! read-modify-write that tolerates its target having vanished.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tabkeep_bus::{BrowserEvent, EventEnvelope};
use tabkeep_core::types::{BusMessage, TabStatus};
use tabkeep_core::{BrowserAdapter, MessageBusAdapter, TabId, TabkeepError};

use crate::extraction::refresh_queue;
use crate::queue_cache::QueueCache;
use crate::relationships::RelationshipStore;

/// What a startup reconcile cleaned up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub live_tabs: usize,
    pub relationships_dropped: usize,
    pub queues_swept: usize,
}

pub struct LifecycleHandler {
    browser: Arc<dyn BrowserAdapter>,
    bus: Arc<dyn MessageBusAdapter>,
    relationships: RelationshipStore,
    queues: QueueCache,
}

impl LifecycleHandler {
    pub fn new(
        browser: Arc<dyn BrowserAdapter>,
        bus: Arc<dyn MessageBusAdapter>,
        relationships: RelationshipStore,
        queues: QueueCache,
    ) -> Self {
        Self {
            browser,
            bus,
            relationships,
            queues,
        }
    }

    /// Applies one event, then tells listeners that tabs changed.
    ///
    /// Failures are logged, never returned: this is background bookkeeping.
    pub async fn handle(&self, event: &BrowserEvent) {
        if let Err(e) = self.apply(event).await {
            if e.is_transient() {
                debug!(kind = event.kind(), tab_id = %event.tab_id(), error = %e, "event target vanished");
            } else {
                warn!(kind = event.kind(), tab_id = %event.tab_id(), error = %e, "lifecycle event failed");
            }
        }
        notify_tabs_updated(self.bus.as_ref()).await;
    }

    async fn apply(&self, event: &BrowserEvent) -> Result<(), TabkeepError> {
        match event {
            BrowserEvent::TabCreated { tab } => {
                // A reused identity must not inherit the queue of the tab that held it.
                if self.queues.migrate_on_close(tab.id).await? {
                    debug!(tab_id = %tab.id, "stale session queue folded on identity reuse");
                }
                if let Some(opener) = tab.opener_tab_id {
                    self.relationships.record_child(tab.id, opener).await?;
                }
                Ok(())
            }
            BrowserEvent::TabRemoved { tab_id, .. } => {
                let forgotten = self.relationships.forget(*tab_id).await;
                let migrated = self.queues.migrate_on_close(*tab_id).await;
                forgotten?;
                migrated?;
                Ok(())
            }
            BrowserEvent::TabUpdated { tab } if tab.status == TabStatus::Complete => {
                refresh_queue(self.browser.as_ref(), &self.queues, tab).await?;
                Ok(())
            }
            BrowserEvent::TabUpdated { .. } | BrowserEvent::TabActivated { .. } => Ok(()),
        }
    }

    /// Consumes `events` until the bus closes, one task per event.
    pub fn spawn(self: Arc<Self>, mut events: broadcast::Receiver<EventEnvelope>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(envelope) => {
                        let handler = Arc::clone(&self);
                        tokio::spawn(async move {
                            debug!(sequence = envelope.sequence, kind = envelope.event.kind(), "handling event");
                            handler.handle(&envelope.event).await;
                        });
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "lifecycle handler lagged, events dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("event bus closed, lifecycle handler stopping");
                        break;
                    }
                }
            }
        })
    }

    /// Drops state keyed by tabs that no longer exist, e.g. after a browser restart.
    pub async fn reconcile(&self) -> Result<ReconcileReport, TabkeepError> {
        let live: HashSet<TabId> = self
            .browser
            .query_tabs()
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        let report = ReconcileReport {
            live_tabs: live.len(),
            relationships_dropped: self.relationships.retain_live(&live).await?,
            queues_swept: self.queues.sweep_orphans(&live).await?,
        };
        info!(
            live_tabs = report.live_tabs,
            relationships_dropped = report.relationships_dropped,
            queues_swept = report.queues_swept,
            "session state reconciled"
        );
        Ok(report)
    }
}

/// Broadcasts `tabsUpdated`. Having nobody listening is normal.
pub async fn notify_tabs_updated(bus: &dyn MessageBusAdapter) {
    match bus.send(BusMessage::TabsUpdated).await {
        Ok(_) => {}
        Err(e) if e.is_transient() => debug!(error = %e, "no listener for tabsUpdated"),
        Err(e) => warn!(error = %e, "tabsUpdated broadcast failed"),
    }
}
