// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Browser lifecycle events and the envelope they travel in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tabkeep_core::types::Tab;
use tabkeep_core::{TabId, WindowId};

/// A lifecycle notification from the browser host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BrowserEvent {
    /// A tab was opened. `tab.opener_tab_id` names its opener when known.
    TabCreated { tab: Tab },
    /// A tab was closed, possibly as part of its window closing.
    #[serde(rename_all = "camelCase")]
    TabRemoved {
        tab_id: TabId,
        window_id: WindowId,
        window_closing: bool,
    },
    /// A tab's URL, title or loading status changed.
    TabUpdated { tab: Tab },
    /// A tab became the active tab of its window.
    #[serde(rename_all = "camelCase")]
    TabActivated { tab_id: TabId, window_id: WindowId },
}

impl BrowserEvent {
    /// The tab the event is about.
    pub fn tab_id(&self) -> TabId {
        match self {
            BrowserEvent::TabCreated { tab } | BrowserEvent::TabUpdated { tab } => tab.id,
            BrowserEvent::TabRemoved { tab_id, .. } | BrowserEvent::TabActivated { tab_id, .. } => {
                *tab_id
            }
        }
    }

    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            BrowserEvent::TabCreated { .. } => "tab_created",
            BrowserEvent::TabRemoved { .. } => "tab_removed",
            BrowserEvent::TabUpdated { .. } => "tab_updated",
            BrowserEvent::TabActivated { .. } => "tab_activated",
        }
    }
}

/// A published event with its bus-assigned metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub id: Uuid,
    /// Strictly increasing per bus, starting at 1.
    pub sequence: u64,
    pub received_at: DateTime<Utc>,
    pub event: BrowserEvent,
}
