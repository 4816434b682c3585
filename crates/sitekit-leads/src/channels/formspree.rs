// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Formspree: JSON post to `<endpoint>/<form_id>`, any 2xx is success.

use async_trait::async_trait;
use serde_json::json;
use sitekit_config::model::FormspreeConfig;
use sitekit_core::{
    AdapterType, DeliveryChannel, DeliveryReceipt, HealthStatus, Lead, PluginAdapter,
    SitekitError,
};

use super::{error_body, required, transport_error};
use crate::format::MessageFormatter;

pub struct FormspreeChannel {
    client: reqwest::Client,
    url: String,
}

impl FormspreeChannel {
    pub fn new(config: &FormspreeConfig, client: reqwest::Client) -> Result<Self, SitekitError> {
        let form_id = required(&config.form_id, "formspree.form_id")?;
        Ok(Self {
            client,
            url: format!("{}/{form_id}", config.endpoint.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl PluginAdapter for FormspreeChannel {
    fn name(&self) -> &str {
        "formspree"
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
impl DeliveryChannel for FormspreeChannel {
    async fn attempt(&self, lead: &Lead) -> Result<DeliveryReceipt, SitekitError> {
        let payload = json!({
            "_subject": MessageFormatter::title(lead),
            "name": lead.name,
            "email": lead.email,
            "phone": lead.phone,
            "service": lead.service,
            "message": lead.message,
            "form_type": lead.form_type,
            "lead_id": lead.lead_id,
            "page_url": lead.context.url,
        });

        let response = self
            .client
            .post(&self.url)
            .header("accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error("formspree", e))?;

        let status = response.status();
        if status.is_success() {
            Ok(DeliveryReceipt::new("formspree"))
        } else {
            let body = error_body(response).await;
            Err(SitekitError::channel(format!("formspree returned {status}: {body}")))
        }
    }
}
