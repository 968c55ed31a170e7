// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all host adapters must implement.

use async_trait::async_trait;

use crate::error::TabkeepError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for every adapter plugged into the session subsystem.
///
/// Browser hosts, storage backends and message buses all implement this,
/// which provides identity and a health check.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the type of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, TabkeepError>;
}
