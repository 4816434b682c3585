// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Apps Script web app that appends the lead to a sheet.

use async_trait::async_trait;
use serde::Deserialize;
use sitekit_config::model::GoogleSheetsConfig;
use sitekit_core::{
    AdapterType, DeliveryChannel, DeliveryReceipt, HealthStatus, Lead, PluginAdapter,
    SitekitError,
};

use super::{error_body, required, transport_error};

/// Scripts conventionally answer `{"result":"success"|"error", "error":…}`.
#[derive(Debug, Deserialize)]
struct ScriptReply {
    result: String,
    #[serde(default)]
    error: Option<String>,
}

pub struct GoogleSheetsChannel {
    client: reqwest::Client,
    script_url: String,
}

impl GoogleSheetsChannel {
    pub fn new(config: &GoogleSheetsConfig, client: reqwest::Client) -> Result<Self, SitekitError> {
        Ok(Self {
            client,
            script_url: required(&config.script_url, "google_sheets.script_url")?,
        })
    }
}

#[async_trait]
impl PluginAdapter for GoogleSheetsChannel {
    fn name(&self) -> &str {
        "google_sheets"
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
impl DeliveryChannel for GoogleSheetsChannel {
    async fn attempt(&self, lead: &Lead) -> Result<DeliveryReceipt, SitekitError> {
        let response = self
            .client
            .post(&self.script_url)
            .json(lead)
            .send()
            .await
            .map_err(|e| transport_error("google_sheets", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(SitekitError::channel(format!(
                "google_sheets returned {status}: {body}"
            )));
        }

        // Scripts that answer with something other than the JSON convention
        // are taken at their 2xx word.
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ScriptReply>(&body) {
            Ok(reply) if reply.result == "error" => Err(SitekitError::channel(format!(
                "google_sheets script failed: {}",
                reply.error.unwrap_or_else(|| "unknown error".into())
            ))),
            _ => Ok(DeliveryReceipt::new("google_sheets")),
        }
    }
}
