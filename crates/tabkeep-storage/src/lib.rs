// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence layer for the Tabkeep session subsystem.
//!
//! Provides a WAL-mode SQLite key-value backend with embedded migrations, an
//! in-memory backend, and typed single-writer repositories over both.

pub mod adapter;
pub mod database;
pub mod memory;
pub mod migrations;
pub mod repository;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use memory::MemoryStorage;
pub use repository::{Repositories, Repository};
