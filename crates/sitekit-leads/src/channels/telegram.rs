// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram Bot API `sendMessage` with HTML parse mode.
//!
//! Used either as a regular channel in the chain or as the fire-and-forget
//! notifier after it.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use sitekit_config::model::{SiteConfig, TelegramConfig};
use sitekit_core::{
    AdapterType, DeliveryChannel, DeliveryReceipt, HealthStatus, Lead, PluginAdapter,
    SitekitError,
};
use tracing::debug;

use super::{required, transport_error};
use crate::format::MessageFormatter;

#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

pub struct TelegramChannel {
    client: reqwest::Client,
    send_url: String,
    chat_id: String,
    formatter: MessageFormatter,
}

impl TelegramChannel {
    pub fn new(
        config: &TelegramConfig,
        site: &SiteConfig,
        client: reqwest::Client,
    ) -> Result<Self, SitekitError> {
        let token = required(&config.bot_token, "telegram.bot_token")?;
        Ok(Self {
            client,
            send_url: format!(
                "{}/bot{token}/sendMessage",
                config.api_base.trim_end_matches('/')
            ),
            chat_id: required(&config.chat_id, "telegram.chat_id")?,
            formatter: MessageFormatter::new(site.utc_offset_minutes),
        })
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
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
impl DeliveryChannel for TelegramChannel {
    async fn attempt(&self, lead: &Lead) -> Result<DeliveryReceipt, SitekitError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": self.formatter.telegram_html(lead),
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        // The URL embeds the bot token, so transport errors are reported
        // without it.
        let response = self
            .client
            .post(&self.send_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error("telegram", e.without_url()))?;

        let status = response.status();
        let reply: TelegramReply = response
            .json()
            .await
            .map_err(|e| transport_error("telegram", e.without_url()))?;

        if reply.ok {
            let message_id = reply.result.map(|m| m.message_id);
            debug!(lead_id = %lead.lead_id, ?message_id, "telegram message sent");
            let receipt = DeliveryReceipt::new("telegram");
            Ok(match message_id {
                Some(id) => receipt.with_detail(id.to_string()),
                None => receipt,
            })
        } else {
            Err(SitekitError::channel(format!(
                "telegram returned {status}: {}",
                reply.description.unwrap_or_else(|| "unknown error".into())
            )))
        }
    }
}
