// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! reqwest-backed network adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use sitekit_core::{
    AdapterType, FetchRequest, FetchResponse, HealthStatus, NetworkAdapter, PluginAdapter,
    SitekitError,
};

/// Headers a proxied response must not carry over.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "proxy-connection",
];

pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    pub fn new(timeout: Duration) -> Result<Self, SitekitError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sitekit-worker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SitekitError::Network {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for HttpNetwork {
    fn name(&self) -> &str {
        "http"
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
impl NetworkAdapter for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SitekitError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| SitekitError::network(format!("invalid method {}: {e}", request.method)))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                builder = builder.header(name, value);
            }
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(|e| SitekitError::Network {
            message: format!("fetch {} failed: {e}", request.url),
            source: Some(Box::new(e)),
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !HOP_BY_HOP.contains(&name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|e| SitekitError::Network {
            message: format!("reading body of {} failed: {e}", request.url),
            source: Some(Box::new(e)),
        })?;

        Ok(FetchResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn network() -> HttpNetwork {
        HttpNetwork::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn forwards_headers_and_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app.js"))
            .and(header("cache-control", "no-cache"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/javascript")
                    .set_body_string("console.log(1)"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let req = FetchRequest::get(format!("{}/app.js", server.uri()))
            .with_header("Cache-Control", "no-cache");
        let resp = network().fetch(&req).await.unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("Content-Type"), Some("text/javascript"));
        assert_eq!(resp.body, b"console.log(1)");
    }

    #[tokio::test]
    async fn forwards_request_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/form"))
            .and(wiremock::matchers::body_string("a=1"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let req = FetchRequest::get(format!("{}/api/form", server.uri()))
            .with_method("POST")
            .with_body("a=1");
        assert_eq!(network().fetch(&req).await.unwrap().status, 201);
    }

    #[tokio::test]
    async fn error_statuses_are_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let req = FetchRequest::get(format!("{}/missing", server.uri()));
        assert_eq!(network().fetch(&req).await.unwrap().status, 404);
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let server = MockServer::start().await;
        let url = format!("{}/gone", server.uri());
        drop(server);

        let err = network().fetch(&FetchRequest::get(url)).await.unwrap_err();
        assert!(matches!(err, SitekitError::Network { .. }));
    }
}
