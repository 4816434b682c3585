// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits: backend lifecycle and the origin-scoped key-value store.

use async_trait::async_trait;

use crate::error::SitekitError;
use crate::traits::adapter::PluginAdapter;

/// Lifecycle of a persistence backend.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the backend (migrations, connection).
    async fn initialize(&self) -> Result<(), SitekitError>;

    /// Closes the backend, flushing pending writes.
    async fn close(&self) -> Result<(), SitekitError>;
}

/// Durable string key-value persistence keyed by fixed names.
///
/// Holds the local lead log, popup status and worker version bookkeeping.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SitekitError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), SitekitError>;

    async fn remove(&self, key: &str) -> Result<(), SitekitError>;

    /// Every key starting with `prefix`, in key order.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, SitekitError>;
}
