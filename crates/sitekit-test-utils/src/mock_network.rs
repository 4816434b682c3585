// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted origin for cache worker tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sitekit_core::{
    AdapterType, FetchRequest, FetchResponse, HealthStatus, NetworkAdapter, PluginAdapter,
    SitekitError,
};
use tokio::sync::{watch, Mutex};

/// Serves registered responses by exact URL; unknown URLs get a 404.
///
/// While offline every fetch fails with a network error. While held, fetches
/// are recorded and then wait for [`MockNetwork::release`] before answering.
pub struct MockNetwork {
    routes: Mutex<HashMap<String, FetchResponse>>,
    offline: AtomicBool,
    held: watch::Sender<bool>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self {
            routes: Mutex::default(),
            offline: AtomicBool::new(false),
            held: watch::channel(false).0,
            requests: Mutex::default(),
        }
    }
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stall every fetch after it is recorded.
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    /// Let stalled and future fetches answer.
    pub fn release(&self) {
        self.held.send_replace(false);
    }

    /// Resolve once `url` has been requested at least `count` times.
    pub async fn wait_for_requests(&self, url: &str, count: usize) {
        while self.request_count(url).await < count {
            tokio::task::yield_now().await;
        }
    }

    pub async fn route(&self, url: impl Into<String>, response: FetchResponse) {
        self.routes.lock().await.insert(url.into(), response);
    }

    /// Register a 200 response with a text body.
    pub async fn serve(&self, url: impl Into<String>, body: &str) {
        self.route(url, FetchResponse::new(200, body)).await;
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every request seen, including ones made while offline.
    pub async fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.url == url)
            .count()
    }
}

#[async_trait]
impl PluginAdapter for MockNetwork {
    fn name(&self) -> &str {
        "mock-network"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Network
    }

    async fn health_check(&self) -> Result<HealthStatus, SitekitError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SitekitError> {
        Ok(())
    }
}

#[async_trait]
impl NetworkAdapter for MockNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SitekitError> {
        self.requests.lock().await.push(request.clone());
        let mut held = self.held.subscribe();
        // The sender lives as long as self, so this only returns once released.
        let _ = held.wait_for(|held| !*held).await;
        if self.offline.load(Ordering::SeqCst) {
            return Err(SitekitError::network(format!(
                "offline: cannot reach {}",
                request.url
            )));
        }
        Ok(self
            .routes
            .lock()
            .await
            .get(request.cache_key())
            .cloned()
            .unwrap_or_else(|| FetchResponse::new(404, "not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_routes_and_goes_offline() {
        let network = MockNetwork::new();
        network.serve("https://site.test/a.css", "body{}").await;

        let req = FetchRequest::get("https://site.test/a.css");
        assert_eq!(network.fetch(&req).await.unwrap().body, b"body{}");
        let missing = FetchRequest::get("https://site.test/b.css");
        assert_eq!(network.fetch(&missing).await.unwrap().status, 404);

        network.set_offline(true);
        assert!(network.fetch(&req).await.is_err());
        assert_eq!(network.request_count("https://site.test/a.css").await, 2);
    }

    #[tokio::test]
    async fn held_fetch_waits_for_release() {
        let network = std::sync::Arc::new(MockNetwork::new());
        network.serve("https://site.test/", "home").await;
        network.hold();

        let pending = {
            let network = network.clone();
            tokio::spawn(async move {
                network.fetch(&FetchRequest::get("https://site.test/")).await
            })
        };
        network.wait_for_requests("https://site.test/", 1).await;
        assert!(!pending.is_finished());

        network.release();
        assert_eq!(pending.await.unwrap().unwrap().body, b"home");
    }
}
