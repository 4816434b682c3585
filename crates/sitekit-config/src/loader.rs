// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./sitekit.toml` > `~/.config/sitekit/sitekit.toml` > `/etc/sitekit/sitekit.toml`
//! with environment variable overrides via `SITEKIT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SitekitConfig;

/// Top-level sections, longest first so `google_sheets_` wins over shorter prefixes.
const SECTIONS: &[&str] = &[
    "google_sheets",
    "web3forms",
    "formspree",
    "whatsapp",
    "telegram",
    "emailjs",
    "gateway",
    "storage",
    "worker",
    "popup",
    "leads",
    "site",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/sitekit/sitekit.toml` (system-wide)
/// 3. `~/.config/sitekit/sitekit.toml` (user XDG config)
/// 4. `./sitekit.toml` (local directory)
/// 5. `SITEKIT_*` environment variables
pub fn load_config() -> Result<SitekitConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<SitekitConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SitekitConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SitekitConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SitekitConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SitekitConfig::default()))
        .merge(Toml::file("/etc/sitekit/sitekit.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("sitekit/sitekit.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("sitekit.toml"))
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config key.
///
/// `telegram_bot_token` becomes `telegram.bot_token`, never `telegram.bot.token`.
pub fn env_key_to_path(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
            .filter(|r| !r.is_empty())
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

/// Create the environment variable provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because many keys contain
/// underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("SITEKIT_").map(|key| env_key_to_path(key.as_str()).into())
}
