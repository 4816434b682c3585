// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp click-to-chat: builds a `wa.me` link and hands it to a launcher.
//!
//! There is no server-side API here; "delivery" means the link was handed
//! to whoever opens it (the visitor's browser via the gateway response, or a
//! terminal in the CLI). The link travels back in the receipt detail.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use sitekit_config::model::{SiteConfig, WhatsAppConfig};
use sitekit_core::{
    AdapterType, DeliveryChannel, DeliveryReceipt, HealthStatus, Lead, PluginAdapter,
    SitekitError,
};
use tracing::info;

use super::required;
use crate::format::MessageFormatter;

const WA_ME: &str = "https://wa.me";

/// Opens (or forwards) a chat deep link.
pub trait LinkLauncher: Send + Sync {
    fn launch(&self, url: &str) -> Result<(), SitekitError>;
}

/// Launcher that only logs the link; the receipt still carries it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLauncher;

impl LinkLauncher for TracingLauncher {
    fn launch(&self, url: &str) -> Result<(), SitekitError> {
        info!(%url, "whatsapp link ready");
        Ok(())
    }
}

pub struct WhatsAppChannel {
    phone_number: String,
    enabled: bool,
    formatter: MessageFormatter,
    launcher: Arc<dyn LinkLauncher>,
}

impl WhatsAppChannel {
    pub fn new(
        config: &WhatsAppConfig,
        site: &SiteConfig,
        launcher: Arc<dyn LinkLauncher>,
    ) -> Result<Self, SitekitError> {
        let phone_number: String = required(&config.phone_number, "whatsapp.phone_number")?
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if phone_number.is_empty() {
            return Err(SitekitError::Config(
                "whatsapp.phone_number must contain digits".into(),
            ));
        }
        Ok(Self {
            phone_number,
            enabled: config.enable_direct_message,
            formatter: MessageFormatter::new(site.utc_offset_minutes),
            launcher,
        })
    }

    /// `https://wa.me/<digits>?text=<form-encoded summary>`.
    pub fn chat_link(&self, lead: &Lead) -> Result<Url, SitekitError> {
        Url::parse_with_params(
            &format!("{WA_ME}/{}", self.phone_number),
            &[("text", self.formatter.whatsapp(lead))],
        )
        .map_err(|e| SitekitError::Channel {
            message: format!("failed to build whatsapp link: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl PluginAdapter for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, SitekitError> {
        if self.enabled {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded("direct messages disabled".into()))
        }
    }

    async fn shutdown(&self) -> Result<(), SitekitError> {
        Ok(())
    }
}

#[async_trait]
impl DeliveryChannel for WhatsAppChannel {
    async fn attempt(&self, lead: &Lead) -> Result<DeliveryReceipt, SitekitError> {
        if !self.enabled {
            return Err(SitekitError::channel("whatsapp direct messages are disabled"));
        }
        let link = self.chat_link(lead)?;
        self.launcher.launch(link.as_str())?;
        Ok(DeliveryReceipt::new("whatsapp").with_detail(link.to_string()))
    }
}
