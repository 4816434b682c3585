// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sitekit serve`: storage, lead pipeline, cache worker and gateway.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sitekit_config::SitekitConfig;
use sitekit_core::{SitekitError, StorageAdapter};
use sitekit_gateway::{GatewayState, ServerConfig};
use sitekit_leads::{LeadPipeline, PopupGate, TracingLauncher};
use sitekit_prometheus::PrometheusAdapter;
use sitekit_storage::SqliteStorage;
use sitekit_worker::{CacheWorker, ClientHub, HttpNetwork, WorkerState};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::shutdown;

/// Upstream fetches made by the worker give up after this long.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

const POPUP_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Open the configured SQLite database.
pub(crate) async fn open_storage(config: &SitekitConfig) -> Result<Arc<SqliteStorage>, SitekitError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// Runs the gateway until SIGINT/SIGTERM.
pub async fn run_serve(config: SitekitConfig) -> Result<(), SitekitError> {
    crate::init_tracing(&config.site.log_level);

    info!(site = %config.site.name, origin = %config.site.origin, "starting sitekit");

    let storage = open_storage(&config).await?;

    let metrics = match PrometheusAdapter::new() {
        Ok(adapter) => Some(Arc::new(adapter)),
        Err(e) => {
            warn!(error = %e, "metrics disabled");
            None
        }
    };

    let pipeline = Arc::new(LeadPipeline::from_config(
        &config,
        storage.clone(),
        Arc::new(TracingLauncher),
    )?);
    info!(channels = ?pipeline.channel_names(), "lead pipeline ready");

    let popup = Arc::new(PopupGate::new(storage.clone(), config.popup.clone()));

    let clients = ClientHub::new();
    let worker = Arc::new(CacheWorker::from_config(
        &config,
        Arc::new(HttpNetwork::new(UPSTREAM_TIMEOUT)?),
        storage.clone(),
        storage.clone(),
        clients,
    )?);

    let cancel = shutdown::install_signal_handler();

    spawn_install(worker.clone(), cancel.clone());
    tokio::spawn(popup_sweeper(popup.clone(), cancel.clone()));

    #[cfg(not(target_env = "msvc"))]
    tokio::spawn(memory_monitor(cancel.clone()));

    let mut state = GatewayState::new(pipeline.clone(), worker, popup, config.site.origin.clone())
        .with_push_token(config.gateway.push_token.clone());
    if let Some(adapter) = metrics {
        state = state.with_metrics(Arc::new(move || adapter.render()));
    }

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    let served = sitekit_gateway::start_server(&server_config, state, cancel.clone().cancelled_owned()).await;

    cancel.cancel();
    info!("flushing pending notifications");
    pipeline.flush_notifications().await;
    if let Err(e) = storage.close().await {
        warn!(error = %e, "storage close failed");
    }

    info!("sitekit stopped");
    served
}

/// Install the worker in the background, then wait for clients of the
/// previous version to go away if it is left waiting.
fn spawn_install(worker: Arc<CacheWorker>, cancel: CancellationToken) {
    tokio::spawn(async move {
        match worker.install().await {
            Ok(WorkerState::Installed) => {
                info!(version = worker.version(), "worker waiting for clients of the previous version to close");
                tokio::select! {
                    result = worker.activate_when_idle() => {
                        if let Err(e) = result {
                            error!(error = %e, "worker activation failed");
                        }
                    }
                    _ = cancel.cancelled() => {}
                }
            }
            Ok(state) => info!(version = worker.version(), %state, "worker installed"),
            Err(e) => error!(error = %e, "worker install failed, previous version keeps serving"),
        }
    });
}

/// Drop expired popup records once an hour.
async fn popup_sweeper(popup: Arc<PopupGate>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(POPUP_SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = popup.sweep(Utc::now()).await {
                    warn!(error = %e, "popup sweep failed");
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}

/// Background task that samples jemalloc stats and feeds the memory gauges.
#[cfg(not(target_env = "msvc"))]
async fn memory_monitor(cancel: CancellationToken) {
    use tikv_jemalloc_ctl::{epoch, stats};

    let mut interval = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if epoch::advance().is_err() {
                    continue;
                }
                if let Ok(allocated) = stats::allocated::read() {
                    sitekit_prometheus::set_memory_heap(allocated as f64);
                }
                if let Ok(resident) = stats::resident::read() {
                    sitekit_prometheus::set_memory_resident(resident as f64);
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}
