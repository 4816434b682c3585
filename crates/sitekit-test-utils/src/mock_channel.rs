// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock delivery channel for deterministic pipeline tests.
//!
//! `MockDeliveryChannel` implements `DeliveryChannel` with scripted outcomes
//! and captures every lead it was offered.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use sitekit_core::{
    AdapterType, DeliveryChannel, DeliveryReceipt, HealthStatus, Lead, LeadId, PluginAdapter,
    SitekitError,
};

/// What one attempt does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    Accept,
    Reject(String),
    /// Never answers; only a timeout ends the attempt.
    Hang,
}

/// A scripted delivery channel.
///
/// Attempts consume the script front to back; once it is empty every
/// attempt uses the fallback behavior.
pub struct MockDeliveryChannel {
    name: String,
    script: Mutex<VecDeque<Behavior>>,
    fallback: Behavior,
    delay: Option<Duration>,
    attempts: Mutex<Vec<LeadId>>,
}

impl MockDeliveryChannel {
    fn with_fallback(name: &str, fallback: Behavior) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: None,
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting(name: &str) -> Self {
        Self::with_fallback(name, Behavior::Accept)
    }

    pub fn rejecting(name: &str) -> Self {
        Self::with_fallback(name, Behavior::Reject(format!("{name} rejected the lead")))
    }

    pub fn hanging(name: &str) -> Self {
        Self::with_fallback(name, Behavior::Hang)
    }

    /// Queue outcomes used before the fallback.
    pub fn with_script(self, script: impl IntoIterator<Item = Behavior>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..self
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Ids of every lead offered to this channel, in order.
    pub async fn attempts(&self) -> Vec<LeadId> {
        self.attempts.lock().await.clone()
    }

    pub async fn attempt_count(&self) -> usize {
        self.attempts.lock().await.len()
    }
}

#[async_trait]
impl PluginAdapter for MockDeliveryChannel {
    fn name(&self) -> &str {
        &self.name
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
impl DeliveryChannel for MockDeliveryChannel {
    async fn attempt(&self, lead: &Lead) -> Result<DeliveryReceipt, SitekitError> {
        self.attempts.lock().await.push(lead.lead_id.clone());
        let behavior = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match behavior {
            Behavior::Accept => {
                Ok(DeliveryReceipt::new(&self.name).with_detail(format!("mock-{}", lead.lead_id)))
            }
            Behavior::Reject(message) => Err(SitekitError::channel(message)),
            Behavior::Hang => std::future::pending().await,
        }
    }
}
