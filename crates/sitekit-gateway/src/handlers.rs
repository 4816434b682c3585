// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the control endpoints.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sitekit_core::{FormType, PageContext, SitekitError, WorkerMessage};
use sitekit_leads::{
    is_valid_visitor, validate_submission, FieldError, FormFields, SubmitOutcome, SyncReport, Toast,
};
use sitekit_worker::WorkerState;
use tracing::{debug, info, warn};

use crate::server::GatewayState;

/// Header naming the visitor for popup suppression.
pub const VISITOR_HEADER: &str = "x-sitekit-visitor";

/// Request body for POST /__sitekit/leads.
#[derive(Debug, Deserialize)]
pub struct LeadRequest {
    pub form_type: FormType,
    pub fields: FormFields,
    #[serde(default)]
    pub context: Option<PageContext>,
}

/// Response body for an accepted submission.
#[derive(Debug, Serialize)]
pub struct LeadResponse {
    #[serde(flatten)]
    pub outcome: SubmitOutcome,
    pub toast: Toast,
}

/// Response body for a rejected submission.
#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub errors: Vec<FieldError>,
    pub toast: Toast,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub worker_state: WorkerState,
    pub worker_version: String,
}

#[derive(Debug, Serialize)]
pub struct PopupResponse {
    pub show: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopupAction {
    Dismissed,
    Submitted,
}

#[derive(Debug, Deserialize)]
pub struct PopupRequest {
    pub action: PopupAction,
}

/// Request body for POST /__sitekit/push, shaped like a web push payload.
#[derive(Debug, Deserialize)]
pub struct PushRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_push_url")]
    pub url: String,
}

fn default_push_url() -> String {
    "/".to_string()
}

#[derive(Debug, Serialize)]
pub struct PushResponse {
    /// Pages the notification was handed to.
    pub clients: usize,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// The visitor id, if present and well formed.
fn visitor(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(VISITOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| is_valid_visitor(v))
}

fn bad_visitor() -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        format!("missing or malformed {VISITOR_HEADER} header"),
    )
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        worker_state: state.worker.state(),
        worker_version: state.worker.version().to_string(),
    })
}

/// GET /metrics
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => error_response(StatusCode::SERVICE_UNAVAILABLE, "metrics are not enabled"),
    }
}

/// POST /__sitekit/leads
///
/// Validates the fields, runs the channel chain and answers with the
/// outcome and the toast the page should show.
pub async fn post_lead(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<LeadRequest>,
) -> Response {
    if let Err(errors) = validate_submission(&body.fields, body.form_type) {
        debug!(form_type = %body.form_type, errors = errors.len(), "submission rejected");
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationResponse {
                errors,
                toast: Toast::validation(),
            }),
        )
            .into_response();
    }

    let mut context = body.context.unwrap_or_default();
    if context.user_agent.is_empty()
        && let Some(agent) = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok())
    {
        context.user_agent = agent.to_string();
    }

    let outcome = state
        .pipeline
        .submit_with_context(&body.fields, body.form_type, context)
        .await;

    if outcome.success
        && body.form_type.requires_service()
        && let Some(visitor) = visitor(&headers)
    {
        state.popup.record_submitted(visitor, Utc::now()).await;
    }

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let toast = outcome.toast();
    (status, Json(LeadResponse { outcome, toast })).into_response()
}

/// POST /__sitekit/leads/sync
pub async fn post_sync(State(state): State<GatewayState>) -> Response {
    match state.pipeline.sync_pending().await {
        Ok(report) => Json::<SyncReport>(report).into_response(),
        Err(e) => {
            warn!(error = %e, "lead sync failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /__sitekit/popup
pub async fn get_popup(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    let Some(visitor) = visitor(&headers) else {
        return bad_visitor();
    };
    let show = state.popup.should_show(visitor, Utc::now()).await;
    Json(PopupResponse { show }).into_response()
}

/// POST /__sitekit/popup
pub async fn post_popup(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<PopupRequest>,
) -> Response {
    let Some(visitor) = visitor(&headers) else {
        return bad_visitor();
    };
    match body.action {
        PopupAction::Dismissed => state.popup.record_dismissed(visitor, Utc::now()).await,
        PopupAction::Submitted => state.popup.record_submitted(visitor, Utc::now()).await,
    }
    StatusCode::NO_CONTENT.into_response()
}

/// POST /__sitekit/push
///
/// Relays a push payload to every open page as a `NOTIFICATION` event.
/// Requires `Authorization: Bearer <gateway.push_token>`.
pub async fn post_push(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<PushRequest>,
) -> Response {
    let Some(expected) = state.push_token.as_deref() else {
        return error_response(StatusCode::NOT_FOUND, "push is not enabled");
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if presented != Some(expected) {
        return error_response(StatusCode::UNAUTHORIZED, "invalid push token");
    }

    let title = body.title.trim();
    if title.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "title is required");
    }
    if !is_site_path(&body.url) {
        return error_response(StatusCode::BAD_REQUEST, "url must be a path on this site");
    }

    let clients = state.worker.clients().broadcast(WorkerMessage::Notification {
        title: title.to_string(),
        body: body.body,
        url: body.url,
    });
    info!(clients, "push notification relayed");
    (StatusCode::ACCEPTED, Json(PushResponse { clients })).into_response()
}

/// Same-origin absolute path: `/x`, never `//host` or `\\host`.
fn is_site_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.contains('\\')
}

/// POST /__sitekit/message
pub async fn post_message(
    State(state): State<GatewayState>,
    Json(message): Json<WorkerMessage>,
) -> Response {
    match state.worker.handle_message(message).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e @ SitekitError::InvalidState(_)) => {
            error_response(StatusCode::CONFLICT, e.to_string())
        }
        Err(e) => {
            warn!(error = %e, "worker message failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
