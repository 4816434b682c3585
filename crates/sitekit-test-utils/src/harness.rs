// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a lead pipeline and a cache worker on a temp
//! SQLite database, with mock channels and a mock origin.

use std::sync::Arc;
use std::time::Duration;

use sitekit_config::model::{StorageConfig, WorkerConfig};
use sitekit_config::SitekitConfig;
use sitekit_core::{
    CacheStore, DeliveryChannel, KeyValueStore, NetworkAdapter, SitekitError, StorageAdapter,
};
use sitekit_leads::{LeadLog, LeadPipeline};
use sitekit_storage::SqliteStorage;
use sitekit_worker::{CacheWorker, ClientHub};

use crate::fixtures::TEST_ORIGIN;
use crate::mock_network::MockNetwork;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    channels: Vec<Arc<dyn DeliveryChannel>>,
    notifier: Option<Arc<dyn DeliveryChannel>>,
    log_capacity: usize,
    attempt_timeout: Duration,
    worker: WorkerConfig,
    serve_precache: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            channels: Vec::new(),
            notifier: None,
            log_capacity: 50,
            attempt_timeout: Duration::from_secs(10),
            worker: WorkerConfig::default(),
            serve_precache: true,
        }
    }

    /// Append a channel to the priority chain.
    pub fn with_channel(mut self, channel: Arc<dyn DeliveryChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn DeliveryChannel>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_worker_version(mut self, version: &str) -> Self {
        self.worker.version = version.to_string();
        self
    }

    /// Leave precache assets unrouted so install fails.
    pub fn without_precache_routes(mut self) -> Self {
        self.serve_precache = false;
        self
    }

    /// Build the harness, creating the database and registering routes.
    pub async fn build(self) -> Result<TestHarness, SitekitError> {
        let temp_dir = tempfile::TempDir::new().map_err(SitekitError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let storage = Arc::new(SqliteStorage::new(storage_config.clone()));
        storage.initialize().await?;

        let mut config = SitekitConfig::default();
        config.site.origin = TEST_ORIGIN.to_string();
        config.storage = storage_config;
        config.worker = self.worker;
        config.leads.log_capacity = self.log_capacity;
        config.leads.attempt_timeout_secs = self.attempt_timeout.as_secs().max(1);

        let network = Arc::new(MockNetwork::new());
        if self.serve_precache {
            for path in &config.worker.precache {
                network
                    .serve(format!("{TEST_ORIGIN}{path}"), &format!("precached {path}"))
                    .await;
            }
        }

        let kv: Arc<dyn KeyValueStore> = storage.clone();
        let log = LeadLog::new(Arc::clone(&kv), config.leads.log_key.clone(), self.log_capacity);
        let mut pipeline = LeadPipeline::new(self.channels, log, self.attempt_timeout);
        if let Some(notifier) = self.notifier {
            pipeline = pipeline.with_notifier(notifier);
        }

        let clients = ClientHub::new();
        let worker = CacheWorker::from_config(
            &config,
            network.clone() as Arc<dyn NetworkAdapter>,
            storage.clone() as Arc<dyn CacheStore>,
            kv,
            clients.clone(),
        )?;

        Ok(TestHarness {
            pipeline: Arc::new(pipeline),
            worker: Arc::new(worker),
            storage,
            network,
            clients,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete sitekit stack for integration tests.
pub struct TestHarness {
    pub pipeline: Arc<LeadPipeline>,
    pub worker: Arc<CacheWorker>,
    pub storage: Arc<SqliteStorage>,
    pub network: Arc<MockNetwork>,
    pub clients: ClientHub,
    pub config: SitekitConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Absolute URL on the test origin.
    pub fn url(path: &str) -> String {
        format!("{TEST_ORIGIN}{path}")
    }

    /// A second worker version sharing this harness's storage, network and clients.
    pub fn next_worker(&self, version: &str) -> Result<CacheWorker, SitekitError> {
        let mut config = self.config.clone();
        config.worker.version = version.to_string();
        CacheWorker::from_config(
            &config,
            self.network.clone() as Arc<dyn NetworkAdapter>,
            self.storage.clone() as Arc<dyn CacheStore>,
            self.storage.clone() as Arc<dyn KeyValueStore>,
            self.clients.clone(),
        )
    }
}
