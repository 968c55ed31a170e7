// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Tabkeep session subsystem.
//!
//! Everything that is persisted serializes with camelCase field names and
//! epoch-millisecond timestamps so stored values stay readable by the
//! extension front end.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Group id the host reports for a tab that belongs to no tab group.
pub const GROUP_ID_NONE: i64 = -1;

/// Host-assigned identity of a live tab. Reused after the tab closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-assigned identity of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter plugged into the subsystem.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Browser,
    Storage,
    MessageBus,
}

// --- Browser host types ---

/// Loading status of a tab as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Unloaded,
    #[default]
    Loading,
    Complete,
}

/// A live tab as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    /// Zero-based on-screen position within the window.
    pub index: u32,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fav_icon_url: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default = "default_group_id")]
    pub group_id: i64,
    /// Tab that opened this one, when the host knows it.
    #[serde(default)]
    pub opener_tab_id: Option<TabId>,
    #[serde(default)]
    pub status: TabStatus,
}

fn default_group_id() -> i64 {
    GROUP_ID_NONE
}

/// A window as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub id: WindowId,
    #[serde(default)]
    pub focused: bool,
}

/// Properties for a tab created inside an existing window.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTab {
    pub window_id: WindowId,
    pub url: String,
    pub pinned: bool,
    pub index: Option<u32>,
    pub active: bool,
}

/// Properties for a new window.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateWindow {
    /// URL of the seed tab. `None` lets the host pick its own blank page.
    pub url: Option<String>,
    pub focused: bool,
}

/// A window freshly created by the host together with its seed tab(s).
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedWindow {
    pub window: Window,
    pub tabs: Vec<Tab>,
}

/// Attribute changes applied to an existing tab. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabUpdate {
    pub url: Option<String>,
    pub pinned: Option<bool>,
    pub active: Option<bool>,
}

/// Scripts the session subsystem asks the host to inject into a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ScriptKind {
    /// Read the ordered item queue rendered by the page.
    ExtractQueue,
}

/// A cross-component message delivered over the host message bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BusMessage {
    /// Tab state changed; listeners should refresh.
    TabsUpdated,
}

impl BusMessage {
    /// Wire name of the message, used in logs and errors.
    pub fn action(&self) -> &'static str {
        match self {
            BusMessage::TabsUpdated => "tabsUpdated",
        }
    }
}

// --- Persisted session types ---

/// Stored value of one relationship: the parent of the map key's child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEntry {
    pub parent_id: TabId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// A child → parent opener edge between two live tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipEdge {
    pub child: TabId,
    pub parent: TabId,
    pub created_at: DateTime<Utc>,
}

/// One element of a scraped ordered queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub item_id: String,
    pub title: String,
    pub url: String,
}

/// A cached queue together with the canonical page it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    pub owner_url: String,
    pub items: Vec<QueueItem>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
}

/// Frozen description of one tab inside a deactivated window.
///
/// `original_id` and `parent_tab_id` only have meaning relative to the other
/// entries of the same snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub favicon_url: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    pub index: u32,
    #[serde(default = "default_group_id")]
    pub group_id: i64,
    pub original_id: TabId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_tab_id: Option<TabId>,
}

/// A deactivated window: its tabs and their relationship edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub id: WindowId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub deactivated_at: DateTime<Utc>,
    pub name: String,
    pub tabs: Vec<TabSnapshot>,
}

impl WindowSnapshot {
    /// Whether `other` describes the same capture (window id and capture time).
    pub fn same_capture(&self, other: &WindowSnapshot) -> bool {
        self.id == other.id && self.deactivated_at == other.deactivated_at
    }
}
