// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Pluggable backends extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility. The storage seams
//! ([`KeyValueStore`], [`CacheStore`]) are plain async traits so in-memory
//! doubles stay small.

pub mod adapter;
pub mod cache;
pub mod channel;
pub mod network;
pub mod storage;

pub use adapter::PluginAdapter;
pub use cache::CacheStore;
pub use channel::DeliveryChannel;
pub use network::NetworkAdapter;
pub use storage::{KeyValueStore, StorageAdapter};
