// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for sitekit.
//!
//! Serves the lead API, popup gate, worker messaging and event stream, and
//! answers every other request through the cache worker.

pub mod handlers;
pub mod proxy;
pub mod server;
pub mod sse;

pub use handlers::VISITOR_HEADER;
pub use server::{build_router, start_server, GatewayState, HealthState, ServerConfig};
