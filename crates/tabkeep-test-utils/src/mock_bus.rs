// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock message bus adapter.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use tabkeep_core::types::BusMessage;
use tabkeep_core::{AdapterType, HealthStatus, MessageBusAdapter, PluginAdapter, TabkeepError};

/// A message bus that captures every message it is asked to send.
///
/// With [`MockBus::without_receiver`] every send fails with
/// [`TabkeepError::NoReceiver`], as the host does when no popup is open.
#[derive(Default)]
pub struct MockBus {
    sent: Arc<Mutex<Vec<BusMessage>>>,
    no_receiver: AtomicBool,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_receiver() -> Self {
        let bus = Self::default();
        bus.no_receiver.store(true, Ordering::SeqCst);
        bus
    }

    /// Messages attempted so far, including ones that found no receiver.
    pub async fn sent_messages(&self) -> Vec<BusMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl PluginAdapter for MockBus {
    fn name(&self) -> &str {
        "mock-bus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MessageBus
    }

    async fn health_check(&self) -> Result<HealthStatus, TabkeepError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl MessageBusAdapter for MockBus {
    async fn send(&self, message: BusMessage) -> Result<serde_json::Value, TabkeepError> {
        let action = message.action();
        self.sent.lock().await.push(message);
        if self.no_receiver.load(Ordering::SeqCst) {
            return Err(TabkeepError::NoReceiver(action.to_string()));
        }
        Ok(serde_json::Value::Null)
    }
}
