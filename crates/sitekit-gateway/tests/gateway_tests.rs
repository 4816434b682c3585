// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level tests driving the router with `oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sitekit_config::model::PopupConfig;
use sitekit_core::{KeyValueStore, WorkerMessage};
use sitekit_gateway::{build_router, GatewayState, VISITOR_HEADER};
use sitekit_leads::PopupGate;
use sitekit_test_utils::{MockDeliveryChannel, TestHarness, TEST_ORIGIN};
use sitekit_worker::WorkerState;
use tower::ServiceExt;

async fn app(harness: &TestHarness) -> Router {
    let popup = Arc::new(PopupGate::new(harness.storage.clone(), PopupConfig::default()));
    let state = GatewayState::new(
        harness.pipeline.clone(),
        harness.worker.clone(),
        popup,
        TEST_ORIGIN,
    )
    .with_metrics(Arc::new(|| "sitekit_leads_total 1\n".to_string()));
    build_router(state)
}

async fn installed_harness() -> TestHarness {
    let harness = TestHarness::builder()
        .with_channel(MockDeliveryChannel::rejecting("web3forms").into_arc())
        .with_channel(MockDeliveryChannel::accepting("telegram").into_arc())
        .build()
        .await
        .unwrap();
    harness.worker.install().await.unwrap();
    harness
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_worker_state() {
    let harness = installed_harness().await;
    let response = app(&harness)
        .await
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["worker_state"], "activated");
    assert_eq!(json["worker_version"], "v1.0.0");
}

#[tokio::test]
async fn metrics_render_prometheus_text() {
    let harness = installed_harness().await;
    let response = app(&harness)
        .await
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("sitekit_leads_total"));
}

#[tokio::test]
async fn valid_lead_is_delivered_by_fallback_channel() {
    let harness = installed_harness().await;
    let request = post_json(
        "/__sitekit/leads",
        json!({
            "form_type": "contact",
            "fields": {"name": "Asha", "email": "asha@example.com", "phone": "9876543210"}
        }),
    );

    let response = app(&harness).await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["method"], "telegram");
    assert_eq!(json["toast"]["title"], "Message Sent!");
    let lead_id = json["lead_id"].as_str().unwrap().to_string();
    assert!(lead_id.starts_with("LEAD_"));

    let entries = harness.pipeline.log().entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].lead.lead_id.as_str(), lead_id);
}

#[tokio::test]
async fn invalid_lead_returns_every_field_error() {
    let harness = installed_harness().await;
    let request = post_json(
        "/__sitekit/leads",
        json!({
            "form_type": "popup_consultation",
            "fields": {"name": "A", "email": "nope", "phone": "12"}
        }),
    );

    let response = app(&harness).await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "email", "phone", "service"]);
    assert_eq!(json["toast"]["kind"], "error");
    assert!(harness.pipeline.log().entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn sync_reports_counts() {
    let harness = installed_harness().await;
    let response = app(&harness)
        .await
        .oneshot(
            Request::post("/__sitekit/leads/sync")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"attempted": 0, "delivered": 0}));
}

#[tokio::test]
async fn popup_is_hidden_after_dismissal() {
    let harness = installed_harness().await;
    let app = app(&harness).await;

    let ask = || {
        Request::get("/__sitekit/popup")
            .header(VISITOR_HEADER, "visitor-1")
            .body(Body::empty())
            .unwrap()
    };
    let first = app.clone().oneshot(ask()).await.unwrap();
    assert_eq!(body_json(first).await, json!({"show": true}));

    let mut dismiss = post_json("/__sitekit/popup", json!({"action": "dismissed"}));
    dismiss
        .headers_mut()
        .insert(VISITOR_HEADER, "visitor-1".parse().unwrap());
    let recorded = app.clone().oneshot(dismiss).await.unwrap();
    assert_eq!(recorded.status(), StatusCode::NO_CONTENT);

    let second = app.oneshot(ask()).await.unwrap();
    assert_eq!(body_json(second).await, json!({"show": false}));
}

#[tokio::test]
async fn popup_without_visitor_is_bad_request() {
    let harness = installed_harness().await;
    let response = app(&harness)
        .await
        .oneshot(Request::get("/__sitekit/popup").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_visitor_is_refused_and_nothing_is_stored() {
    let harness = installed_harness().await;
    let mut dismiss = post_json("/__sitekit/popup", json!({"action": "dismissed"}));
    dismiss
        .headers_mut()
        .insert(VISITOR_HEADER, "v".repeat(4096).parse().unwrap());

    let response = app(&harness).await.oneshot(dismiss).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(harness
        .storage
        .keys_with_prefix(&PopupConfig::default().storage_key)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn skip_waiting_message_activates_waiting_worker() {
    let harness = installed_harness().await;
    let page = harness.clients.connect();

    let mut config = harness.config.clone();
    config.worker.version = "v2".into();
    config.worker.skip_waiting = false;
    let next = Arc::new(
        sitekit_worker::CacheWorker::from_config(
            &config,
            harness.network.clone(),
            harness.storage.clone(),
            harness.storage.clone(),
            harness.clients.clone(),
        )
        .unwrap(),
    );
    assert_eq!(next.install().await.unwrap(), WorkerState::Installed);

    let popup = Arc::new(PopupGate::new(harness.storage.clone(), PopupConfig::default()));
    let app = build_router(GatewayState::new(
        harness.pipeline.clone(),
        next.clone(),
        popup,
        TEST_ORIGIN,
    ));
    let response = app
        .oneshot(post_json("/__sitekit/message", json!({"type": "SKIP_WAITING"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(next.state(), WorkerState::Activated);
    drop(page);
}

#[tokio::test]
async fn unknown_message_type_is_rejected() {
    let harness = installed_harness().await;
    let response = app(&harness)
        .await
        .oneshot(post_json("/__sitekit/message", json!({"type": "RELOAD"})))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn pages_are_served_through_the_worker() {
    let harness = installed_harness().await;
    harness
        .network
        .serve(TestHarness::url("/about.html?ref=nav"), "about us")
        .await;
    let app = app(&harness).await;

    let page = || {
        Request::get("/about.html?ref=nav")
            .header("sec-fetch-mode", "navigate")
            .body(Body::empty())
            .unwrap()
    };
    let online = app.clone().oneshot(page()).await.unwrap();
    assert_eq!(online.status(), StatusCode::OK);
    assert_eq!(body_text(online).await, "about us");

    harness.network.set_offline(true);
    let offline = app.oneshot(page()).await.unwrap();
    assert_eq!(offline.status(), StatusCode::OK);
    assert_eq!(body_text(offline).await, "about us");
}

#[tokio::test]
async fn offline_navigation_gets_offline_page() {
    let harness = installed_harness().await;
    harness.network.set_offline(true);

    let response = app(&harness)
        .await
        .oneshot(
            Request::get("/pricing.html")
                .header("sec-fetch-mode", "navigate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "precached /offline.html");
}

#[tokio::test]
async fn offline_subresource_without_cache_is_bad_gateway() {
    let harness = installed_harness().await;
    harness.network.set_offline(true);

    let response = app(&harness)
        .await
        .oneshot(
            Request::get("/js/app.js")
                .header("sec-fetch-dest", "script")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

fn push_app(harness: &TestHarness, token: Option<&str>) -> Router {
    let popup = Arc::new(PopupGate::new(harness.storage.clone(), PopupConfig::default()));
    build_router(
        GatewayState::new(
            harness.pipeline.clone(),
            harness.worker.clone(),
            popup,
            TEST_ORIGIN,
        )
        .with_push_token(token.map(str::to_string)),
    )
}

fn push_request(token: Option<&str>, body: Value) -> Request<Body> {
    let mut request = post_json("/__sitekit/push", body);
    if let Some(token) = token {
        request
            .headers_mut()
            .insert("authorization", format!("Bearer {token}").parse().unwrap());
    }
    request
}

#[tokio::test]
async fn push_is_relayed_to_open_pages() {
    let harness = installed_harness().await;
    let mut page = harness.clients.connect();

    let response = push_app(&harness, Some("s3cret"))
        .oneshot(push_request(
            Some("s3cret"),
            json!({"title": "Free audit", "body": "This week only"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await, json!({"clients": 1}));
    assert_eq!(
        page.recv().await,
        Some(WorkerMessage::Notification {
            title: "Free audit".into(),
            body: "This week only".into(),
            url: "/".into(),
        })
    );
}

#[tokio::test]
async fn push_requires_configured_token() {
    let harness = installed_harness().await;
    let body = json!({"title": "Hi"});

    let disabled = push_app(&harness, None)
        .oneshot(push_request(Some("s3cret"), body.clone()))
        .await
        .unwrap();
    assert_eq!(disabled.status(), StatusCode::NOT_FOUND);

    let app = push_app(&harness, Some("s3cret"));
    let missing = app.clone().oneshot(push_request(None, body.clone())).await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    let wrong = app.clone().oneshot(push_request(Some("guess"), body)).await.unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let offsite = app
        .oneshot(push_request(
            Some("s3cret"),
            json!({"title": "Hi", "url": "https://elsewhere.test/"}),
        ))
        .await
        .unwrap();
    assert_eq!(offsite.status(), StatusCode::BAD_REQUEST);
}
