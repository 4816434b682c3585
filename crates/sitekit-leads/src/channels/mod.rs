// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in delivery channels.
//!
//! Each channel maps a [`Lead`](sitekit_core::Lead) into one provider's
//! payload and interprets that provider's success indicator. Every failure
//! is returned as [`SitekitError::Channel`] so the pipeline can fall back.

pub mod emailjs;
pub mod formspree;
pub mod google_sheets;
pub mod telegram;
pub mod web3forms;
pub mod whatsapp;

use std::time::Duration;

use sitekit_core::SitekitError;

pub use emailjs::EmailJsChannel;
pub use formspree::FormspreeChannel;
pub use google_sheets::GoogleSheetsChannel;
pub use telegram::TelegramChannel;
pub use web3forms::Web3FormsChannel;
pub use whatsapp::{LinkLauncher, TracingLauncher, WhatsAppChannel};

/// Build the HTTP client shared by all channels.
///
/// The client timeout is a transport bound; the pipeline applies its own
/// per-attempt timeout on top.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, SitekitError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("sitekit/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SitekitError::Channel {
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Wrap a transport failure from `channel`.
pub(crate) fn transport_error(channel: &str, err: reqwest::Error) -> SitekitError {
    SitekitError::Channel {
        message: format!("{channel} request failed: {err}"),
        source: Some(Box::new(err)),
    }
}

/// Require a configured credential, naming the config key when absent.
pub(crate) fn required(value: &Option<String>, key: &str) -> Result<String, SitekitError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SitekitError::Config(format!("{key} is required for this channel")))
}

/// Read a response body for error messages, truncated.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > 200 {
        let mut cut = 200;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
