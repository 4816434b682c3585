// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fallback route: every non-control request goes through the cache worker.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use sitekit_core::{Destination, FetchRequest, FetchResponse, RequestMode};
use tracing::{debug, warn};

use crate::server::GatewayState;

/// Largest request body forwarded to the origin.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Request headers that only make sense for the hop to the gateway.
const SKIPPED_REQUEST_HEADERS: &[&str] = &["host", "connection", "content-length"];

pub async fn fetch_through_worker(State(state): State<GatewayState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, format!("request body rejected: {e}"))
                .into_response();
        }
    };

    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{path}", state.origin);
    let fetch = to_fetch_request(parts.method.as_str(), url, &parts.headers, body.to_vec());

    match state.worker.fetch(&fetch).await {
        Ok(response) => to_response(response),
        Err(e) => {
            warn!(url = %fetch.url, error = %e, "fetch failed with no fallback");
            (StatusCode::BAD_GATEWAY, format!("upstream unavailable: {e}")).into_response()
        }
    }
}

/// Describe an incoming request the way a browser would hand it to a worker.
pub fn to_fetch_request(
    method: &str,
    url: String,
    headers: &HeaderMap,
    body: Vec<u8>,
) -> FetchRequest {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let mode = match header("sec-fetch-mode") {
        Some("navigate") => RequestMode::Navigate,
        Some("cors") => RequestMode::Cors,
        Some("no-cors") => RequestMode::NoCors,
        _ => RequestMode::SameOrigin,
    };
    let destination = header("sec-fetch-dest")
        .map(Destination::from_sec_fetch_dest)
        .unwrap_or(if mode == RequestMode::Navigate {
            Destination::Document
        } else {
            Destination::Other
        });

    let mut request = FetchRequest::get(url)
        .with_method(method)
        .with_mode(mode)
        .with_destination(destination)
        .with_body(body);
    for (name, value) in headers {
        if SKIPPED_REQUEST_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    request
}

fn to_response(response: FetchResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut out = Response::builder().status(status);
    if let Some(headers) = out.headers_mut() {
        for (name, value) in &response.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => debug!(header = %name, "dropping unrepresentable response header"),
            }
        }
    }
    out.body(Body::from(response.body))
        .unwrap_or_else(|e| (StatusCode::BAD_GATEWAY, e.to_string()).into_response())
}
