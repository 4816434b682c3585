// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network adapter trait used by the cache worker to reach the origin.

use async_trait::async_trait;

use crate::error::SitekitError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{FetchRequest, FetchResponse};

/// Performs real fetches on behalf of the cache worker.
///
/// Any HTTP status is a successful fetch; `Err` means the request never
/// produced a response (connection refused, DNS, timeout).
#[async_trait]
pub trait NetworkAdapter: PluginAdapter {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SitekitError>;
}
