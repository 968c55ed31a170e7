// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed in-process event bus carrying browser lifecycle notifications.
//!
//! The host integration publishes [`BrowserEvent`]s; the session lifecycle
//! handler subscribes and processes each one in its own task.

pub mod bus;
pub mod events;

pub use bus::EventBus;
pub use events::{BrowserEvent, EventEnvelope};
