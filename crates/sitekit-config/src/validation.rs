// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates constraints serde cannot express: channel credentials, worker
//! precache consistency, numeric lower bounds, and URL shapes.

use std::collections::HashSet;

use sitekit_core::ChannelKind;

use crate::diagnostic::ConfigError;
use crate::model::SitekitConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &SitekitConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let origin = config.site.origin.trim();
    if !(origin.starts_with("http://") || origin.starts_with("https://")) {
        errors.push(ConfigError::validation(format!(
            "site.origin `{origin}` must be an absolute http(s) URL"
        )));
    }

    if config.leads.channels.is_empty() {
        errors.push(ConfigError::validation(
            "leads.channels must list at least one channel",
        ));
    }

    let mut seen = HashSet::new();
    for kind in &config.leads.channels {
        if !seen.insert(kind) {
            errors.push(ConfigError::validation(format!(
                "duplicate channel `{kind}` in leads.channels"
            )));
        }
    }

    let mut checked = HashSet::new();
    let used = config.leads.channels.iter().copied().chain(config.leads.notify);
    for kind in used.filter(|k| checked.insert(*k)) {
        for missing in missing_credentials(config, kind) {
            errors.push(ConfigError::validation(format!(
                "{missing} is required when `{kind}` is used as a lead channel"
            )));
        }
    }

    if config.leads.attempt_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "leads.attempt_timeout_secs must be at least 1",
        ));
    }

    if config.leads.log_capacity == 0 {
        errors.push(ConfigError::validation(
            "leads.log_capacity must be at least 1",
        ));
    }

    if config.worker.version.trim().is_empty() {
        errors.push(ConfigError::validation("worker.version must not be empty"));
    }

    if config.worker.cache_prefix.trim().is_empty() {
        errors.push(ConfigError::validation(
            "worker.cache_prefix must not be empty",
        ));
    }

    if !config.worker.offline_url.starts_with('/') {
        errors.push(ConfigError::validation(format!(
            "worker.offline_url `{}` must be an origin-relative path",
            config.worker.offline_url
        )));
    } else if !config
        .worker
        .precache
        .iter()
        .any(|p| p == &config.worker.offline_url)
    {
        errors.push(ConfigError::validation(format!(
            "worker.precache must include the offline page `{}`",
            config.worker.offline_url
        )));
    }

    for path in &config.worker.precache {
        if !path.starts_with('/') {
            errors.push(ConfigError::validation(format!(
                "worker.precache entry `{path}` must be an origin-relative path"
            )));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::validation("gateway.host must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Dotted names of credential keys a channel needs but does not have.
fn missing_credentials(config: &SitekitConfig, kind: ChannelKind) -> Vec<&'static str> {
    fn absent(value: &Option<String>) -> bool {
        value.as_deref().is_none_or(|v| v.trim().is_empty())
    }

    let mut missing = Vec::new();
    match kind {
        ChannelKind::Web3forms => {
            if absent(&config.web3forms.access_key) {
                missing.push("web3forms.access_key");
            }
        }
        ChannelKind::Emailjs => {
            if absent(&config.emailjs.service_id) {
                missing.push("emailjs.service_id");
            }
            if absent(&config.emailjs.template_id) {
                missing.push("emailjs.template_id");
            }
            if absent(&config.emailjs.public_key) {
                missing.push("emailjs.public_key");
            }
        }
        ChannelKind::Formspree => {
            if absent(&config.formspree.form_id) {
                missing.push("formspree.form_id");
            }
        }
        ChannelKind::Telegram => {
            if absent(&config.telegram.bot_token) {
                missing.push("telegram.bot_token");
            }
            if absent(&config.telegram.chat_id) {
                missing.push("telegram.chat_id");
            }
        }
        ChannelKind::GoogleSheets => {
            if absent(&config.google_sheets.script_url) {
                missing.push("google_sheets.script_url");
            }
        }
        ChannelKind::Whatsapp => {
            if absent(&config.whatsapp.phone_number) {
                missing.push("whatsapp.phone_number");
            }
        }
    }
    missing
}
