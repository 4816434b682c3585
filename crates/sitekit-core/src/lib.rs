// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for sitekit.
//!
//! Provides the error type, the shared lead and fetch types, and the adapter
//! traits implemented by delivery channels, the network layer, and the
//! storage backends.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SitekitError;
pub use types::{
    AdapterType, ChannelKind, DeliveryMethod, DeliveryReceipt, Destination, FetchRequest,
    FetchResponse, FormType, HealthStatus, Lead, LeadId, PageContext, RequestMode, WorkerMessage,
};

pub use traits::{
    CacheStore, DeliveryChannel, KeyValueStore, NetworkAdapter, PluginAdapter, StorageAdapter,
};
