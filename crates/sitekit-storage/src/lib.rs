// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for sitekit.
//!
//! WAL-mode SQLite with embedded refinery migrations and a single-writer
//! model through `tokio-rusqlite`. One database holds the key-value records
//! (lead log, popup status, worker bookkeeping) and the versioned cache stores.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
