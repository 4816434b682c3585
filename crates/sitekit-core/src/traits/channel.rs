// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery channel trait for remote lead notification providers.

use async_trait::async_trait;

use crate::error::SitekitError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DeliveryReceipt, Lead};

/// A remote channel a lead can be delivered through (form relay, email
/// API, chat bot, spreadsheet hook, chat deep link).
///
/// `attempt` returns `Err` both for transport failures and for providers
/// that answered but rejected the payload. The pipeline treats every error
/// as recoverable and moves on to the next channel.
#[async_trait]
pub trait DeliveryChannel: PluginAdapter {
    /// Try to deliver the lead once.
    async fn attempt(&self, lead: &Lead) -> Result<DeliveryReceipt, SitekitError>;
}
