// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-component message bus adapter trait.

use async_trait::async_trait;

use crate::error::TabkeepError;
use crate::traits::adapter::PluginAdapter;
use crate::types::BusMessage;

/// Adapter for the host's cross-component message bus (popup, side panel, ...).
#[async_trait]
pub trait MessageBusAdapter: PluginAdapter {
    /// Sends a message and waits for the receiver's response.
    ///
    /// Returns [`TabkeepError::NoReceiver`] when nothing is listening, which
    /// callers treat as an expected outcome.
    async fn send(&self, message: BusMessage) -> Result<serde_json::Value, TabkeepError>;
}
