// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named, request-keyed response cache used by the cache worker.

use async_trait::async_trait;

use crate::error::SitekitError;
use crate::types::FetchResponse;

/// A collection of named cache stores, each mapping request keys to responses.
///
/// Store names embed the worker version, so a new version is a distinct store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Opens (creating if needed) the named store.
    async fn open(&self, store: &str) -> Result<(), SitekitError>;

    /// Lists every existing store name.
    async fn keys(&self) -> Result<Vec<String>, SitekitError>;

    /// Deletes a store and all its entries. Returns whether it existed.
    async fn delete(&self, store: &str) -> Result<bool, SitekitError>;

    /// Looks up a request key inside one store.
    async fn match_entry(
        &self,
        store: &str,
        key: &str,
    ) -> Result<Option<FetchResponse>, SitekitError>;

    /// Writes (or overwrites) an entry in an existing store.
    ///
    /// Returns `false` without writing when the store does not exist, so a
    /// late write can never bring back a store that activation deleted.
    async fn put(
        &self,
        store: &str,
        key: &str,
        response: &FetchResponse,
    ) -> Result<bool, SitekitError>;

    /// Lists request keys held by a store.
    async fn entry_keys(&self, store: &str) -> Result<Vec<String>, SitekitError>;
}
