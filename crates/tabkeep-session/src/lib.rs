// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session persistence for the Tabkeep tab manager.
//!
//! Tracks opener relationships between live tabs, caches queues scraped from
//! queue-bearing pages, and turns whole windows into restorable snapshots.
//! All state lives under three storage keys and survives host restarts.

pub mod canonical;
pub mod capture;
pub mod codec;
pub mod extraction;
pub mod lifecycle;
pub mod queue_cache;
pub mod relationships;
pub mod restore;
pub mod service;
pub mod snapshots;
pub mod tree;

/// Storage key of the child → parent relationship map.
pub const RELATIONSHIPS_KEY: &str = "tabRelationships";
/// Storage key of the queue cache (canonical and per-tab entries).
pub const QUEUES_KEY: &str = "youtubeQueues";
/// Storage key of the ordered inactive window list, newest first.
pub const INACTIVE_WINDOWS_KEY: &str = "inactiveWindows";

pub use canonical::{CanonicalUrl, QueueInfo, QueueParams, canonicalize, queue_info};
pub use capture::SnapshotCapture;
pub use codec::{ExportDocument, ImportResult};
pub use lifecycle::{LifecycleHandler, ReconcileReport};
pub use queue_cache::{EvictionPolicy, QueueCache, QueueLookup};
pub use relationships::RelationshipStore;
pub use restore::{FailedTab, RestoreOutcome, SnapshotRestorer};
pub use service::{ActionResult, Request, Response, SessionService, TabView};
pub use snapshots::SnapshotStore;
pub use tree::{Forest, ForestEntry, ForestNode, build_forest, snapshot_edges};
