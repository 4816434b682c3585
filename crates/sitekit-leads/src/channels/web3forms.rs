// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web3Forms relay: form fields posted as JSON, `success` flag in the reply.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use sitekit_config::model::{SiteConfig, Web3FormsConfig};
use sitekit_core::{
    AdapterType, DeliveryChannel, DeliveryReceipt, HealthStatus, Lead, PluginAdapter,
    SitekitError,
};
use tracing::debug;

use super::{error_body, required, transport_error};
use crate::format::MessageFormatter;

#[derive(Debug, Deserialize)]
struct Web3FormsReply {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

pub struct Web3FormsChannel {
    client: reqwest::Client,
    endpoint: String,
    access_key: String,
    site_name: String,
    formatter: MessageFormatter,
}

impl Web3FormsChannel {
    pub fn new(
        config: &Web3FormsConfig,
        site: &SiteConfig,
        client: reqwest::Client,
    ) -> Result<Self, SitekitError> {
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            access_key: required(&config.access_key, "web3forms.access_key")?,
            site_name: site.name.clone(),
            formatter: MessageFormatter::new(site.utc_offset_minutes),
        })
    }

    fn payload(&self, lead: &Lead) -> serde_json::Value {
        json!({
            "access_key": self.access_key,
            "subject": format!("{} - {}", MessageFormatter::title(lead), self.site_name),
            "from_name": self.site_name,
            "name": lead.name,
            "email": lead.email,
            "phone": lead.phone,
            "service": lead.service.as_deref().unwrap_or("Not specified"),
            "message": lead.message.as_deref().unwrap_or(""),
            "form_type": lead.form_type,
            "lead_id": lead.lead_id,
            "page_url": lead.context.url,
            "referrer": lead.context.referrer,
            "submitted_at": self.formatter.display_date(crate::lead::submitted_at(lead)),
        })
    }
}

#[async_trait]
impl PluginAdapter for Web3FormsChannel {
    fn name(&self) -> &str {
        "web3forms"
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
impl DeliveryChannel for Web3FormsChannel {
    async fn attempt(&self, lead: &Lead) -> Result<DeliveryReceipt, SitekitError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("accept", "application/json")
            .json(&self.payload(lead))
            .send()
            .await
            .map_err(|e| transport_error("web3forms", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(SitekitError::channel(format!(
                "web3forms returned {status}: {body}"
            )));
        }

        let reply: Web3FormsReply = response
            .json()
            .await
            .map_err(|e| transport_error("web3forms", e))?;
        debug!(lead_id = %lead.lead_id, success = reply.success, "web3forms replied");

        if reply.success {
            let receipt = DeliveryReceipt::new("web3forms");
            Ok(match reply.message {
                Some(message) => receipt.with_detail(message),
                None => receipt,
            })
        } else {
            Err(SitekitError::channel(format!(
                "web3forms rejected lead: {}",
                reply.message.unwrap_or_else(|| "no reason given".into())
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::tests_support::sample_lead;

    fn channel(server: &MockServer) -> Web3FormsChannel {
        let config = Web3FormsConfig {
            access_key: Some("w3f-key".into()),
            endpoint: format!("{}/submit", server.uri()),
        };
        Web3FormsChannel::new(&config, &SiteConfig::default(), reqwest::Client::new()).unwrap()
    }

    #[tokio::test]
    async fn success_flag_accepts_lead() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(body_partial_json(json!({
                "access_key": "w3f-key",
                "form_type": "contact",
                "name": "A",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "message": "Email sent"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let receipt = channel(&server).attempt(&sample_lead()).await.unwrap();
        assert_eq!(receipt.channel, "web3forms");
        assert_eq!(receipt.detail.as_deref(), Some("Email sent"));
    }

    #[tokio::test]
    async fn provider_rejection_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "message": "Invalid access key"})),
            )
            .mount(&server)
            .await;

        let err = channel(&server).attempt(&sample_lead()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid access key"));
    }

    #[tokio::test]
    async fn non_2xx_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = channel(&server).attempt(&sample_lead()).await.unwrap_err();
        assert!(matches!(err, SitekitError::Channel { .. }));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn missing_access_key_is_a_config_error() {
        let config = Web3FormsConfig {
            access_key: None,
            endpoint: "http://localhost".into(),
        };
        let result = Web3FormsChannel::new(&config, &SiteConfig::default(), reqwest::Client::new());
        assert!(matches!(result, Err(SitekitError::Config(_))));
    }
}
