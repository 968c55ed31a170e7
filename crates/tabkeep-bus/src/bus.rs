// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use tabkeep_config::model::BusConfig;

use crate::events::{BrowserEvent, EventEnvelope};

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Fan-out bus for browser lifecycle events.
///
/// Publishing never blocks. Subscribers that fall more than the configured
/// capacity behind observe `RecvError::Lagged` and skip ahead.
#[derive(Debug)]
pub struct EventBus {
    next_sequence: AtomicU64,
    sender: broadcast::Sender<EventEnvelope>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self {
            next_sequence: AtomicU64::new(0),
            sender,
        }
    }

    pub fn from_config(config: &BusConfig) -> Self {
        Self::new(config.event_capacity)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Stamps `event` and delivers it to every current subscriber.
    ///
    /// Events published while nobody is subscribed are dropped, but still
    /// consume a sequence number.
    pub fn publish(&self, event: BrowserEvent) -> EventEnvelope {
        let envelope = EventEnvelope {
            id: Uuid::new_v4(),
            sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed) + 1,
            received_at: Utc::now(),
            event,
        };

        if self.sender.receiver_count() > 0 {
            let _ = self.sender.send(envelope.clone());
        } else {
            trace!(
                sequence = envelope.sequence,
                kind = envelope.event.kind(),
                "event dropped, no subscribers"
            );
        }

        envelope
    }
}
