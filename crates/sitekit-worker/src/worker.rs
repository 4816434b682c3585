// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The cache worker: one deployed version, its cache store and lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::Url;
use serde::Serialize;
use sitekit_config::SitekitConfig;
use sitekit_config::model::WorkerConfig;
use sitekit_core::{
    CacheStore, FetchRequest, FetchResponse, KeyValueStore, NetworkAdapter, SitekitError,
    WorkerMessage,
};
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::clients::ClientHub;
use crate::lifecycle::WorkerState;
use crate::policy::{ResourceClass, Strategy};

/// Key-value entry holding the version that last activated.
pub const ACTIVE_VERSION_KEY: &str = "sitekit_worker_active_version";

const OFFLINE_DOCUMENT: &str = "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>Offline</title></head>\n<body><h1>You are offline</h1><p>Please check your connection and try again.</p></body>\n</html>\n";

/// Snapshot reported by health checks and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerStatus {
    pub version: String,
    pub cache_name: String,
    pub state: WorkerState,
    /// Store currently answering fetches, if any.
    pub controlling_store: Option<String>,
    pub clients: usize,
}

pub struct CacheWorker {
    version: String,
    cache_prefix: String,
    cache_name: String,
    offline_url: String,
    precache: Vec<String>,
    skip_waiting: bool,
    origin: Url,
    network: Arc<dyn NetworkAdapter>,
    caches: Arc<dyn CacheStore>,
    kv: Arc<dyn KeyValueStore>,
    clients: ClientHub,
    state: watch::Sender<WorkerState>,
    controlling: RwLock<Option<String>>,
    skip_requested: AtomicBool,
    transition: Mutex<()>,
}

impl CacheWorker {
    pub fn new(
        config: &WorkerConfig,
        origin: &str,
        network: Arc<dyn NetworkAdapter>,
        caches: Arc<dyn CacheStore>,
        kv: Arc<dyn KeyValueStore>,
        clients: ClientHub,
    ) -> Result<Self, SitekitError> {
        let origin = Url::parse(origin)
            .map_err(|e| SitekitError::Config(format!("invalid site origin `{origin}`: {e}")))?;
        let (state, _) = watch::channel(WorkerState::Parsed);
        Ok(Self {
            version: config.version.clone(),
            cache_prefix: config.cache_prefix.clone(),
            cache_name: config.cache_name(),
            offline_url: config.offline_url.clone(),
            precache: config.precache.clone(),
            skip_waiting: config.skip_waiting,
            origin,
            network,
            caches,
            kv,
            clients,
            state,
            controlling: RwLock::new(None),
            skip_requested: AtomicBool::new(false),
            transition: Mutex::new(()),
        })
    }

    pub fn from_config(
        config: &SitekitConfig,
        network: Arc<dyn NetworkAdapter>,
        caches: Arc<dyn CacheStore>,
        kv: Arc<dyn KeyValueStore>,
        clients: ClientHub,
    ) -> Result<Self, SitekitError> {
        Self::new(
            &config.worker,
            &config.site.origin,
            network,
            caches,
            kv,
            clients,
        )
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    pub fn clients(&self) -> &ClientHub {
        &self.clients
    }

    pub async fn status(&self) -> WorkerStatus {
        WorkerStatus {
            version: self.version.clone(),
            cache_name: self.cache_name.clone(),
            state: self.state(),
            controlling_store: self.controlling.read().await.clone(),
            clients: self.clients.client_count(),
        }
    }

    /// Version recorded by the last successful activation, from any process.
    pub async fn active_version(&self) -> Option<String> {
        match self.kv.get(ACTIVE_VERSION_KEY).await {
            Ok(version) => version,
            Err(e) => {
                warn!(error = %e, "failed to read active worker version");
                None
            }
        }
    }

    /// Precache every configured asset into this version's store.
    ///
    /// Any failed or non-200 precache fetch deletes the new store and leaves
    /// the worker `redundant`. On success the worker activates right away
    /// unless a different version still has clients open; then it waits in
    /// `installed` until they close or `SKIP_WAITING` arrives.
    pub async fn install(&self) -> Result<WorkerState, SitekitError> {
        let previous = {
            let _transition = self.transition.lock().await;
            self.set_state(WorkerState::Installing)?;
            info!(version = %self.version, store = %self.cache_name, "installing worker");

            let previous = self.active_version().await;
            *self.controlling.write().await = previous
                .as_ref()
                .map(|v| format!("{}-{v}", self.cache_prefix));

            if let Err(e) = self.precache_all().await {
                // A reinstall of the active version must not drop the store it serves from.
                if previous.as_deref() != Some(self.version.as_str()) {
                    match self.caches.delete(&self.cache_name).await {
                        Ok(_) => debug!(store = %self.cache_name, "removed partial store"),
                        Err(cleanup) => {
                            warn!(store = %self.cache_name, error = %cleanup, "failed to remove partial store")
                        }
                    }
                }
                self.set_state(WorkerState::Redundant)?;
                warn!(version = %self.version, error = %e, "worker install failed");
                return Err(e);
            }

            self.set_state(WorkerState::Installed)?;
            previous
        };

        let replaces_other = previous.is_some_and(|v| v != self.version);
        let must_wait = replaces_other && self.clients.client_count() > 0;
        if self.skip_waiting || self.skip_requested.load(Ordering::SeqCst) || !must_wait {
            self.activate().await?;
        } else {
            info!(
                version = %self.version,
                clients = self.clients.client_count(),
                "worker installed, waiting for clients to close"
            );
        }
        Ok(self.state())
    }

    /// Activate once every client has closed, or sooner if something else
    /// activates the worker first.
    pub async fn activate_when_idle(&self) -> Result<(), SitekitError> {
        let mut state = self.state.subscribe();
        tokio::select! {
            _ = self.clients.wait_idle() => {}
            _ = async { let _ = state.wait_for(|s| *s != WorkerState::Installed).await; } => {}
        }
        if self.state() == WorkerState::Installed {
            self.activate().await?;
        }
        Ok(())
    }

    /// Move a waiting worker to activation. Requested before install, it
    /// takes effect as soon as install completes; during install it waits
    /// for install to finish.
    pub async fn skip_waiting(&self) -> Result<(), SitekitError> {
        let transition = self.transition.lock().await;
        match self.state() {
            WorkerState::Parsed | WorkerState::Installing => {
                self.skip_requested.store(true, Ordering::SeqCst);
                Ok(())
            }
            WorkerState::Installed => {
                drop(transition);
                self.activate().await
            }
            WorkerState::Activating | WorkerState::Activated => Ok(()),
            WorkerState::Redundant => Err(SitekitError::InvalidState(
                "a redundant worker cannot activate".into(),
            )),
        }
    }

    /// Handle a page-to-worker message.
    pub async fn handle_message(&self, message: WorkerMessage) -> Result<(), SitekitError> {
        match message {
            WorkerMessage::SkipWaiting => self.skip_waiting().await,
            other => {
                debug!(message = ?other, "ignoring worker-to-page message sent to worker");
                Ok(())
            }
        }
    }

    /// Delete every other store, take control of clients and announce the
    /// new version.
    pub async fn activate(&self) -> Result<(), SitekitError> {
        let _transition = self.transition.lock().await;
        match self.state() {
            WorkerState::Activated => return Ok(()),
            WorkerState::Installed => {}
            other => {
                return Err(SitekitError::InvalidState(format!(
                    "cannot activate a worker that is {other}"
                )));
            }
        }
        self.set_state(WorkerState::Activating)?;
        let previous = self.active_version().await;

        match self.caches.keys().await {
            Ok(names) => {
                for name in names.into_iter().filter(|n| n != &self.cache_name) {
                    match self.caches.delete(&name).await {
                        Ok(_) => info!(store = %name, "deleted stale cache store"),
                        Err(e) => warn!(store = %name, error = %e, "failed to delete stale cache store"),
                    }
                }
            }
            Err(e) => warn!(error = %e, "failed to list cache stores"),
        }

        *self.controlling.write().await = Some(self.cache_name.clone());
        if let Err(e) = self.kv.set(ACTIVE_VERSION_KEY, &self.version).await {
            warn!(error = %e, "failed to record active worker version");
        }
        self.set_state(WorkerState::Activated)?;

        let reached = self.clients.broadcast(WorkerMessage::CacheUpdated {
            version: self.version.clone(),
        });
        if previous.is_some_and(|v| v != self.version) {
            self.clients.broadcast(WorkerMessage::SwUpdated {
                version: self.version.clone(),
            });
        }
        info!(version = %self.version, clients = reached, "worker activated");
        Ok(())
    }

    /// Whether the worker handles `request` at all: same-origin `GET` only.
    pub fn intercepts(&self, request: &FetchRequest) -> bool {
        request.method == "GET"
            && Url::parse(&request.url).is_ok_and(|u| u.origin() == self.origin.origin())
    }

    /// Answer a request the way the active worker would.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SitekitError> {
        let store = self.controlling.read().await.clone();
        let Some(store) = store.filter(|_| self.intercepts(request)) else {
            sitekit_prometheus::record_worker_fetch("passthrough", "network");
            return self.network.fetch(request).await;
        };

        let class = ResourceClass::of(request);
        let key = cache_key(&request.url);
        match class.strategy() {
            Strategy::NetworkFirst => self.network_first(request, &store, &key, class).await,
            Strategy::CacheFirst => self.cache_first(request, &store, &key, class).await,
        }
    }

    async fn network_first(
        &self,
        request: &FetchRequest,
        store: &str,
        key: &str,
        class: ResourceClass,
    ) -> Result<FetchResponse, SitekitError> {
        let class_name = class.to_string();
        match self.network.fetch(&revalidating(request)).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.put_best_effort(store, key, &response).await;
                }
                sitekit_prometheus::record_worker_fetch(&class_name, "network");
                Ok(response)
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "network failed, trying cache");
                if let Some(cached) = self.lookup(store, key).await {
                    sitekit_prometheus::record_worker_fetch(&class_name, "cache");
                    return Ok(cached);
                }
                if !request.is_navigation() {
                    sitekit_prometheus::record_worker_fetch(&class_name, "error");
                    return Err(e);
                }
                sitekit_prometheus::record_worker_fetch(&class_name, "offline");
                let offline = match self.origin.join(&self.offline_url) {
                    Ok(url) => self.lookup(store, &cache_key(url.as_str())).await,
                    Err(_) => None,
                };
                Ok(offline.unwrap_or_else(offline_document))
            }
        }
    }

    async fn cache_first(
        &self,
        request: &FetchRequest,
        store: &str,
        key: &str,
        class: ResourceClass,
    ) -> Result<FetchResponse, SitekitError> {
        let class_name = class.to_string();
        if let Some(cached) = self.lookup(store, key).await {
            sitekit_prometheus::record_worker_fetch(&class_name, "cache");
            return Ok(cached);
        }
        let response = match self.network.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                sitekit_prometheus::record_worker_fetch(&class_name, "error");
                return Err(e);
            }
        };
        if response.is_cacheable() {
            self.put_best_effort(store, key, &response).await;
        }
        sitekit_prometheus::record_worker_fetch(&class_name, "network");
        Ok(response)
    }

    async fn precache_all(&self) -> Result<(), SitekitError> {
        let install_error = |message: String| SitekitError::Install { message };

        self.caches
            .open(&self.cache_name)
            .await
            .map_err(|e| install_error(format!("cannot open {}: {e}", self.cache_name)))?;

        for path in &self.precache {
            let url = self
                .origin
                .join(path)
                .map_err(|e| install_error(format!("bad precache path {path}: {e}")))?;
            let request = revalidating(&FetchRequest::get(url.as_str()));
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| install_error(format!("precache {path}: {e}")))?;
            if !response.is_cacheable() {
                return Err(install_error(format!(
                    "precache {path} returned status {}",
                    response.status
                )));
            }
            let written = self
                .caches
                .put(&self.cache_name, &cache_key(url.as_str()), &response)
                .await
                .map_err(|e| install_error(format!("storing {path}: {e}")))?;
            if !written {
                return Err(install_error(format!(
                    "store {} disappeared while precaching {path}",
                    self.cache_name
                )));
            }
            debug!(path = %path, "precached");
        }
        Ok(())
    }

    async fn lookup(&self, store: &str, key: &str) -> Option<FetchResponse> {
        match self.caches.match_entry(store, key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(store, key, error = %e, "cache lookup failed");
                None
            }
        }
    }

    async fn put_best_effort(&self, store: &str, key: &str, response: &FetchResponse) {
        match self.caches.put(store, key, response).await {
            Ok(true) => {}
            Ok(false) => debug!(store, key, "store deleted while fetching, response not cached"),
            Err(e) => warn!(store, key, error = %e, "cache write failed"),
        }
    }

    fn set_state(&self, next: WorkerState) -> Result<(), SitekitError> {
        let current = self.state();
        if !current.can_become(next) {
            return Err(SitekitError::InvalidState(format!(
                "worker cannot go from {current} to {next}"
            )));
        }
        self.state.send_replace(next);
        debug!(version = %self.version, from = %current, to = %next, "worker state changed");
        Ok(())
    }
}

/// Cache key for a URL: normalized, without fragment.
pub fn cache_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => FetchRequest::get(url).cache_key().to_string(),
    }
}

/// Copy of `request` that bypasses intermediate HTTP caches.
fn revalidating(request: &FetchRequest) -> FetchRequest {
    let mut request = request.clone();
    request
        .headers
        .retain(|(name, _)| !name.eq_ignore_ascii_case("cache-control"));
    request.with_header("Cache-Control", "no-cache")
}

/// Synthesized page for a navigation that neither network nor cache can answer.
pub fn offline_document() -> FetchResponse {
    FetchResponse::new(503, OFFLINE_DOCUMENT)
        .with_header("Content-Type", "text/html; charset=utf-8")
        .with_header("Cache-Control", "no-store")
}
