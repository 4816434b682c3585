// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage backends.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use sitekit_core::{CacheStore, FetchResponse, KeyValueStore, SitekitError};
use tokio::sync::Mutex;

/// Key-value store held in a map.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value for assertions.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SitekitError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SitekitError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SitekitError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, SitekitError> {
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Store whose writes always fail, as when the quota is exhausted.
#[derive(Default)]
pub struct FailingKeyValueStore;

#[async_trait]
impl KeyValueStore for FailingKeyValueStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, SitekitError> {
        Ok(None)
    }

    async fn set(&self, key: &str, _value: &str) -> Result<(), SitekitError> {
        Err(SitekitError::storage(std::io::Error::other(format!(
            "quota exceeded writing {key}"
        ))))
    }

    async fn remove(&self, _key: &str) -> Result<(), SitekitError> {
        Ok(())
    }

    async fn keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>, SitekitError> {
        Ok(Vec::new())
    }
}

/// Named cache stores held in maps.
#[derive(Default)]
pub struct MemoryCacheStore {
    stores: Mutex<BTreeMap<String, HashMap<String, FetchResponse>>>,
    fail_puts: AtomicBool,
    puts: AtomicUsize,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `put` fail.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Successful and failed `put` calls so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn open(&self, store: &str) -> Result<(), SitekitError> {
        self.stores
            .lock()
            .await
            .entry(store.to_string())
            .or_default();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, SitekitError> {
        Ok(self.stores.lock().await.keys().cloned().collect())
    }

    async fn delete(&self, store: &str) -> Result<bool, SitekitError> {
        Ok(self.stores.lock().await.remove(store).is_some())
    }

    async fn match_entry(
        &self,
        store: &str,
        key: &str,
    ) -> Result<Option<FetchResponse>, SitekitError> {
        Ok(self
            .stores
            .lock()
            .await
            .get(store)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(
        &self,
        store: &str,
        key: &str,
        response: &FetchResponse,
    ) -> Result<bool, SitekitError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(SitekitError::Cache {
                message: format!("quota exceeded writing {key}"),
            });
        }
        match self.stores.lock().await.get_mut(store) {
            Some(entries) => {
                entries.insert(key.to_string(), response.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn entry_keys(&self, store: &str) -> Result<Vec<String>, SitekitError> {
        let stores = self.stores.lock().await;
        let mut keys: Vec<String> = stores
            .get(store)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_requires_an_open_store() {
        let caches = MemoryCacheStore::new();
        let response = FetchResponse::new(200, "hi");
        assert!(!caches.put("s-v1", "https://site.test/", &response).await.unwrap());
        assert!(caches.keys().await.unwrap().is_empty());

        caches.open("s-v1").await.unwrap();
        assert!(caches.put("s-v1", "https://site.test/", &response).await.unwrap());
        assert_eq!(caches.keys().await.unwrap(), vec!["s-v1".to_string()]);
        assert!(caches.delete("s-v1").await.unwrap());
        assert!(!caches.delete("s-v1").await.unwrap());
    }

    #[tokio::test]
    async fn failing_puts_are_counted() {
        let caches = MemoryCacheStore::new();
        caches.fail_puts(true);
        let result = caches
            .put("s", "k", &FetchResponse::new(200, "x"))
            .await;
        assert!(result.is_err());
        assert_eq!(caches.put_count(), 1);
        assert!(caches.match_entry("s", "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failing_kv_rejects_writes() {
        let store = FailingKeyValueStore;
        assert!(store.set("k", "v").await.is_err());
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
