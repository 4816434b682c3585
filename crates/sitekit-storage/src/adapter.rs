// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage, key-value and cache traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use sitekit_config::model::StorageConfig;
use sitekit_core::{
    AdapterType, CacheStore, FetchResponse, HealthStatus, KeyValueStore, PluginAdapter,
    SitekitError, StorageAdapter,
};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened lazily by [`StorageAdapter::initialize`]; every
/// other operation fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already open database.
    pub fn from_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: ":memory:".to_string(),
                wal_mode: false,
            },
            db: OnceCell::new_with(Some(db)),
        }
    }

    fn db(&self) -> Result<&Database, SitekitError> {
        self.db.get().ok_or_else(|| SitekitError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SitekitError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SitekitError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), SitekitError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| SitekitError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), SitekitError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, SitekitError> {
        queries::kv::get(self.db()?, key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SitekitError> {
        queries::kv::set(self.db()?, key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), SitekitError> {
        queries::kv::remove(self.db()?, key).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, SitekitError> {
        queries::kv::keys_with_prefix(self.db()?, prefix).await
    }
}

#[async_trait]
impl CacheStore for SqliteStorage {
    async fn open(&self, store: &str) -> Result<(), SitekitError> {
        queries::cache::open_store(self.db()?, store).await
    }

    async fn keys(&self) -> Result<Vec<String>, SitekitError> {
        queries::cache::store_names(self.db()?).await
    }

    async fn delete(&self, store: &str) -> Result<bool, SitekitError> {
        queries::cache::delete_store(self.db()?, store).await
    }

    async fn match_entry(
        &self,
        store: &str,
        key: &str,
    ) -> Result<Option<FetchResponse>, SitekitError> {
        queries::cache::get_entry(self.db()?, store, key).await
    }

    async fn put(
        &self,
        store: &str,
        key: &str,
        response: &FetchResponse,
    ) -> Result<bool, SitekitError> {
        queries::cache::put_entry(self.db()?, store, key, response).await
    }

    async fn entry_keys(&self, store: &str) -> Result<Vec<String>, SitekitError> {
        queries::cache::entry_keys(self.db()?, store).await
    }
}
