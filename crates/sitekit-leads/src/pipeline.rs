// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The lead submission pipeline.
//!
//! Channels are tried strictly in order, one at a time, each under a bounded
//! timeout. The first accepted delivery short-circuits the chain. Whatever
//! happens remotely, the lead is then written to the local log exactly once.

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sitekit_config::SitekitConfig;
use sitekit_core::{
    DeliveryChannel, DeliveryMethod, DeliveryReceipt, FormType, KeyValueStore, Lead, PageContext,
    SitekitError,
};
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::channels::LinkLauncher;
use crate::lead::{build_lead, FormFields};
use crate::log::{LeadLog, StoredLead};
use crate::outcome::SubmitOutcome;
use crate::registry::build_channels;

/// Counts returned by [`LeadPipeline::sync_pending`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub attempted: usize,
    pub delivered: usize,
}

pub struct LeadPipeline {
    channels: Vec<Arc<dyn DeliveryChannel>>,
    notifier: Option<Arc<dyn DeliveryChannel>>,
    log: LeadLog,
    attempt_timeout: Duration,
    background: TaskTracker,
    /// Held for a whole sync run so two runs never deliver the same lead.
    syncing: Mutex<()>,
}

impl LeadPipeline {
    pub fn new(
        channels: Vec<Arc<dyn DeliveryChannel>>,
        log: LeadLog,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            channels,
            notifier: None,
            log,
            attempt_timeout,
            background: TaskTracker::new(),
            syncing: Mutex::new(()),
        }
    }

    /// Add a secondary notification sent after the chain without being awaited.
    pub fn with_notifier(mut self, notifier: Arc<dyn DeliveryChannel>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Wire the configured channels, notifier and lead log.
    pub fn from_config(
        config: &SitekitConfig,
        store: Arc<dyn KeyValueStore>,
        launcher: Arc<dyn LinkLauncher>,
    ) -> Result<Self, SitekitError> {
        let set = build_channels(config, launcher)?;
        let log = LeadLog::new(store, config.leads.log_key.clone(), config.leads.log_capacity);
        let pipeline = Self::new(
            set.chain,
            log,
            Duration::from_secs(config.leads.attempt_timeout_secs),
        );
        Ok(match set.notifier {
            Some(notifier) => pipeline.with_notifier(notifier),
            None => pipeline,
        })
    }

    pub fn log(&self) -> &LeadLog {
        &self.log
    }

    /// Channel names in priority order.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name().to_string()).collect()
    }

    /// Submit already-validated fields with an empty page context.
    pub async fn submit(&self, fields: &FormFields, form_type: FormType) -> SubmitOutcome {
        self.submit_with_context(fields, form_type, PageContext::default())
            .await
    }

    /// Submit already-validated fields captured on a page.
    pub async fn submit_with_context(
        &self,
        fields: &FormFields,
        form_type: FormType,
        context: PageContext,
    ) -> SubmitOutcome {
        let lead = build_lead(fields, form_type, context, Utc::now());
        self.submit_lead(lead).await
    }

    /// Run the chain for a built lead, persist it, then fire the notifier.
    pub async fn submit_lead(&self, lead: Lead) -> SubmitOutcome {
        info!(lead_id = %lead.lead_id, form_type = %lead.form_type, "lead submitted");

        let receipt = self.deliver(&lead).await;
        let method = match &receipt {
            Some(r) => DeliveryMethod::Channel(r.channel.clone()),
            None => DeliveryMethod::Local,
        };

        let entry = StoredLead {
            lead: lead.clone(),
            saved_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            method: method.clone(),
        };
        let success = match self.log.append(entry).await {
            Ok(len) => {
                debug!(lead_id = %lead.lead_id, log_len = len, "lead stored locally");
                true
            }
            Err(e) => {
                error!(lead_id = %lead.lead_id, error = %e, "failed to store lead locally");
                false
            }
        };

        if method.is_local() {
            warn!(lead_id = %lead.lead_id, "no channel accepted the lead, kept locally");
        }
        sitekit_prometheus::record_lead(method.as_str());

        let delivered_by = receipt.as_ref().map(|r| r.channel.as_str());
        self.notify(&lead, delivered_by);

        SubmitOutcome {
            success,
            method,
            lead_id: lead.lead_id,
            detail: receipt.and_then(|r| r.detail),
        }
    }

    /// Re-run the chain for every lead that is only stored locally.
    ///
    /// Runs are serialized; a run that had to wait sees only what the
    /// previous one left pending.
    pub async fn sync_pending(&self) -> Result<SyncReport, SitekitError> {
        let _syncing = self.syncing.lock().await;
        let pending = self.log.pending().await?;
        let mut report = SyncReport::default();

        for entry in pending {
            report.attempted += 1;
            if let Some(receipt) = self.deliver(&entry.lead).await {
                let method = DeliveryMethod::Channel(receipt.channel);
                if self.log.mark_delivered(&entry.lead.lead_id, method).await? {
                    report.delivered += 1;
                }
            }
        }

        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            "pending leads synced"
        );
        Ok(report)
    }

    /// Wait for detached notifications started so far.
    pub async fn flush_notifications(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }

    async fn deliver(&self, lead: &Lead) -> Option<DeliveryReceipt> {
        for channel in &self.channels {
            let name = channel.name();
            match tokio::time::timeout(self.attempt_timeout, channel.attempt(lead)).await {
                Ok(Ok(receipt)) => {
                    info!(lead_id = %lead.lead_id, channel = name, "lead delivered");
                    return Some(receipt);
                }
                Ok(Err(e)) => {
                    warn!(lead_id = %lead.lead_id, channel = name, error = %e, "channel failed, trying next");
                }
                Err(_) => {
                    let e = SitekitError::Timeout {
                        duration: self.attempt_timeout,
                    };
                    warn!(lead_id = %lead.lead_id, channel = name, error = %e, "channel timed out, trying next");
                }
            }
            sitekit_prometheus::record_channel_failure(name);
        }
        None
    }

    fn notify(&self, lead: &Lead, delivered_by: Option<&str>) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        if delivered_by == Some(notifier.name()) {
            return;
        }

        let lead = lead.clone();
        let timeout = self.attempt_timeout;
        self.background.spawn(async move {
            match tokio::time::timeout(timeout, notifier.attempt(&lead)).await {
                Ok(Ok(_)) => debug!(lead_id = %lead.lead_id, notifier = notifier.name(), "notification sent"),
                Ok(Err(e)) => warn!(lead_id = %lead.lead_id, notifier = notifier.name(), error = %e, "notification failed"),
                Err(_) => warn!(lead_id = %lead.lead_id, notifier = notifier.name(), "notification timed out"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use sitekit_core::{AdapterType, HealthStatus, PluginAdapter};

    use super::*;
    use crate::tests_support::{sample_lead, MemoryStore};

    /// Accepts, rejects or never answers, counting attempts.
    struct Stub {
        name: &'static str,
        answer: Option<bool>,
        calls: AtomicUsize,
    }

    impl Stub {
        fn new(name: &'static str, answer: Option<bool>) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PluginAdapter for Stub {
        fn name(&self) -> &str {
            self.name
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }

        fn adapter_type(&self) -> AdapterType {
            AdapterType::Channel
        }

        async fn health_check(&self) -> Result<HealthStatus, SitekitError> {
            Ok(HealthStatus::Healthy)
        }

        async fn shutdown(&self) -> Result<(), SitekitError> {
            Ok(())
        }
    }

    #[async_trait]
    impl DeliveryChannel for Stub {
        async fn attempt(&self, _lead: &Lead) -> Result<DeliveryReceipt, SitekitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                Some(true) => Ok(DeliveryReceipt::new(self.name)),
                Some(false) => Err(SitekitError::channel("rejected")),
                None => std::future::pending().await,
            }
        }
    }

    fn chain(stubs: &[&Arc<Stub>]) -> Vec<Arc<dyn DeliveryChannel>> {
        stubs
            .iter()
            .map(|s| Arc::clone(*s) as Arc<dyn DeliveryChannel>)
            .collect()
    }

    fn pipeline(channels: Vec<Arc<dyn DeliveryChannel>>) -> LeadPipeline {
        let log = LeadLog::new(Arc::new(MemoryStore::default()), "leads", 50);
        LeadPipeline::new(channels, log, Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn hung_channel_times_out_and_chain_continues() {
        let slow = Stub::new("slow", None);
        let fast = Stub::new("fast", Some(true));
        let pipeline = pipeline(chain(&[&slow, &fast]));

        let outcome = pipeline.submit_lead(sample_lead()).await;

        assert!(outcome.success);
        assert_eq!(outcome.method, DeliveryMethod::Channel("fast".into()));
        assert_eq!(slow.calls(), 1);
        assert_eq!(fast.calls(), 1);
    }

    #[tokio::test]
    async fn notifier_is_skipped_when_it_delivered() {
        let telegram = Stub::new("telegram", Some(true));
        let pipeline = pipeline(chain(&[&telegram])).with_notifier(telegram.clone());

        pipeline.submit_lead(sample_lead()).await;
        pipeline.flush_notifications().await;

        assert_eq!(telegram.calls(), 1);
    }

    #[tokio::test]
    async fn notifier_runs_after_local_fallback() {
        let primary = Stub::new("web3forms", Some(false));
        let notifier = Stub::new("telegram", Some(false));
        let pipeline = pipeline(chain(&[&primary])).with_notifier(notifier.clone());

        let outcome = pipeline.submit_lead(sample_lead()).await;
        pipeline.flush_notifications().await;

        assert_eq!(outcome.method, DeliveryMethod::Local);
        assert_eq!(notifier.calls(), 1);
    }

    #[tokio::test]
    async fn empty_chain_stores_locally() {
        let pipeline = pipeline(Vec::new());
        let outcome = pipeline.submit_lead(sample_lead()).await;

        assert!(outcome.success);
        assert!(outcome.method.is_local());
        assert_eq!(pipeline.log().pending().await.unwrap().len(), 1);
    }
}
