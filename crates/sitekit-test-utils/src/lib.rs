// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for sitekit integration tests.
//!
//! Provides in-memory backends, scripted adapters and a harness that wires
//! a pipeline and a cache worker without touching the network.
//!
//! # Components
//!
//! - [`MockDeliveryChannel`] - channel with scripted accept/reject/hang outcomes
//! - [`MockNetwork`] - origin double with per-URL responses and an offline switch
//! - [`MemoryKeyValueStore`], [`MemoryCacheStore`] - in-memory storage seams
//! - [`TestHarness`] - SQLite-backed pipeline plus worker

pub mod fixtures;
pub mod harness;
pub mod memory;
pub mod mock_channel;
pub mod mock_network;

pub use fixtures::{sample_fields, sample_lead, TEST_ORIGIN};
pub use harness::TestHarness;
pub use memory::{FailingKeyValueStore, MemoryCacheStore, MemoryKeyValueStore};
pub use mock_channel::{Behavior, MockDeliveryChannel};
pub use mock_network::MockNetwork;
