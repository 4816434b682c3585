// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sitekit worker status`: what the cache worker has stored on disk.

use colored::Colorize;
use serde::Serialize;
use sitekit_config::SitekitConfig;
use sitekit_core::{CacheStore, KeyValueStore, SitekitError};
use sitekit_worker::ACTIVE_VERSION_KEY;

use crate::serve::open_storage;

/// One cache store and how many entries it holds.
#[derive(Debug, Serialize)]
pub(crate) struct StoreReport {
    pub name: String,
    pub entries: usize,
    pub current: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct WorkerReport {
    pub configured_version: String,
    pub active_version: Option<String>,
    pub stores: Vec<StoreReport>,
}

pub(crate) async fn collect_report(
    config: &SitekitConfig,
    caches: &dyn CacheStore,
    kv: &dyn KeyValueStore,
) -> Result<WorkerReport, SitekitError> {
    let current = config.worker.cache_name();
    let mut stores = Vec::new();
    for name in caches.keys().await? {
        let entries = caches.entry_keys(&name).await?.len();
        stores.push(StoreReport {
            current: name == current,
            name,
            entries,
        });
    }
    Ok(WorkerReport {
        configured_version: config.worker.version.clone(),
        active_version: kv.get(ACTIVE_VERSION_KEY).await?,
        stores,
    })
}

pub async fn run_worker_status(config: &SitekitConfig, json: bool) -> Result<(), SitekitError> {
    let storage = open_storage(config).await?;
    let report = collect_report(config, storage.as_ref(), storage.as_ref()).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| SitekitError::Internal(format!("cannot render status: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    println!("{}", "sitekit worker".bold());
    println!("  configured: {}", report.configured_version);
    match &report.active_version {
        Some(v) if *v == report.configured_version => println!("  active:     {}", v.green()),
        Some(v) => println!("  active:     {} (update pending)", v.yellow()),
        None => println!("  active:     {}", "none".dimmed()),
    }
    if report.stores.is_empty() {
        println!("  no cache stores");
    }
    for store in &report.stores {
        let marker = if store.current { "*" } else { " " };
        println!("  {marker} {:<24} {} entries", store.name, store.entries);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitekit_core::FetchResponse;
    use sitekit_test_utils::{MemoryCacheStore, MemoryKeyValueStore};

    #[tokio::test]
    async fn report_marks_current_store_and_active_version() {
        let config = SitekitConfig::default();
        let caches = MemoryCacheStore::new();
        let kv = MemoryKeyValueStore::new();

        caches.open("sitekit-v0.9.0").await.unwrap();
        caches.open(&config.worker.cache_name()).await.unwrap();
        caches
            .put(
                &config.worker.cache_name(),
                "https://site.test/offline.html",
                &FetchResponse::new(200, b"offline".to_vec()),
            )
            .await
            .unwrap();
        kv.set(ACTIVE_VERSION_KEY, "v0.9.0").await.unwrap();

        let report = collect_report(&config, &caches, &kv).await.unwrap();
        assert_eq!(report.active_version.as_deref(), Some("v0.9.0"));
        assert_eq!(report.stores.len(), 2);
        let current = report.stores.iter().find(|s| s.current).unwrap();
        assert_eq!(current.name, "sitekit-v1.0.0");
        assert_eq!(current.entries, 1);
    }
}
