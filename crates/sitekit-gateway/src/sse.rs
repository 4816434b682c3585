// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events stream of worker broadcasts.
//!
//! Each open stream counts as one controlled client; closing it releases
//! the client, which is what lets a waiting worker activate.
//!
//! ```text
//! event: CACHE_UPDATED
//! data: {"type":"CACHE_UPDATED","version":"v2"}
//! ```

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use sitekit_core::WorkerMessage;

use crate::server::GatewayState;

/// GET /__sitekit/events
pub async fn worker_events(
    State(state): State<GatewayState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let client = state.worker.clients().connect();
    tracing::debug!(clients = state.worker.clients().client_count(), "event stream opened");

    let events = stream::unfold(client, |mut client| async move {
        let message = client.recv().await?;
        Some((Ok(to_event(&message)), client))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

pub fn event_name(message: &WorkerMessage) -> &'static str {
    match message {
        WorkerMessage::SkipWaiting => "SKIP_WAITING",
        WorkerMessage::CacheUpdated { .. } => "CACHE_UPDATED",
        WorkerMessage::SwUpdated { .. } => "SW_UPDATED",
        WorkerMessage::Notification { .. } => "NOTIFICATION",
    }
}

fn to_event(message: &WorkerMessage) -> Event {
    let event = Event::default().event(event_name(message));
    match serde_json::to_string(message) {
        Ok(data) => event.data(data),
        Err(e) => event.comment(format!("unserializable message: {e}")),
    }
}
