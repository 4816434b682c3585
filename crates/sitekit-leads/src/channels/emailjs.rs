// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! EmailJS REST API: template parameters posted as JSON, any 2xx is success.

use async_trait::async_trait;
use serde_json::json;
use sitekit_config::model::{EmailJsConfig, SiteConfig};
use sitekit_core::{
    AdapterType, DeliveryChannel, DeliveryReceipt, HealthStatus, Lead, PluginAdapter,
    SitekitError,
};

use super::{error_body, required, transport_error};
use crate::format::MessageFormatter;

pub struct EmailJsChannel {
    client: reqwest::Client,
    endpoint: String,
    service_id: String,
    template_id: String,
    public_key: String,
    to_email: Option<String>,
    site_name: String,
    formatter: MessageFormatter,
}

impl EmailJsChannel {
    pub fn new(
        config: &EmailJsConfig,
        site: &SiteConfig,
        client: reqwest::Client,
    ) -> Result<Self, SitekitError> {
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            service_id: required(&config.service_id, "emailjs.service_id")?,
            template_id: required(&config.template_id, "emailjs.template_id")?,
            public_key: required(&config.public_key, "emailjs.public_key")?,
            to_email: config.to_email.clone().or_else(|| site.owner_email.clone()),
            site_name: site.name.clone(),
            formatter: MessageFormatter::new(site.utc_offset_minutes),
        })
    }

    fn payload(&self, lead: &Lead) -> serde_json::Value {
        json!({
            "service_id": self.service_id,
            "template_id": self.template_id,
            "user_id": self.public_key,
            "template_params": {
                "to_email": self.to_email,
                "site_name": self.site_name,
                "subject": MessageFormatter::title(lead),
                "from_name": lead.name,
                "from_email": lead.email,
                "reply_to": lead.email,
                "phone": lead.phone,
                "service": lead.service.as_deref().unwrap_or("Not specified"),
                "message": lead.message.as_deref().unwrap_or(""),
                "form_type": lead.form_type,
                "lead_id": lead.lead_id,
                "page_url": lead.context.url,
                "submitted_at": self.formatter.display_date(crate::lead::submitted_at(lead)),
                "summary": self.formatter.plain(lead),
            },
        })
    }
}

#[async_trait]
impl PluginAdapter for EmailJsChannel {
    fn name(&self) -> &str {
        "emailjs"
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
impl DeliveryChannel for EmailJsChannel {
    async fn attempt(&self, lead: &Lead) -> Result<DeliveryReceipt, SitekitError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.payload(lead))
            .send()
            .await
            .map_err(|e| transport_error("emailjs", e))?;

        let status = response.status();
        if status.is_success() {
            Ok(DeliveryReceipt::new("emailjs").with_detail(status.as_u16().to_string()))
        } else {
            let body = error_body(response).await;
            Err(SitekitError::channel(format!("emailjs returned {status}: {body}")))
        }
    }
}
