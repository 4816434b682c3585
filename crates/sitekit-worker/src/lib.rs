// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline cache worker for sitekit.
//!
//! A [`CacheWorker`] owns one versioned cache store. It precaches the
//! configured assets on install, removes other versions' stores on
//! activation, and answers same-origin `GET` requests network-first
//! (documents, scripts, styles) or cache-first (images, fonts).

pub mod clients;
pub mod lifecycle;
pub mod network;
pub mod policy;
pub mod worker;

pub use clients::{ClientGuard, ClientHandle, ClientHub};
pub use lifecycle::WorkerState;
pub use network::HttpNetwork;
pub use policy::{ResourceClass, Strategy};
pub use worker::{cache_key, offline_document, CacheWorker, WorkerStatus, ACTIVE_VERSION_KEY};
