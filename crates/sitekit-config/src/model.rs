// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for sitekit.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use sitekit_core::ChannelKind;

/// Top-level sitekit configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SitekitConfig {
    /// Site identity and origin.
    #[serde(default)]
    pub site: SiteConfig,

    /// Lead pipeline behavior.
    #[serde(default)]
    pub leads: LeadsConfig,

    /// Web3Forms relay settings.
    #[serde(default)]
    pub web3forms: Web3FormsConfig,

    /// EmailJS REST settings.
    #[serde(default)]
    pub emailjs: EmailJsConfig,

    /// Formspree settings.
    #[serde(default)]
    pub formspree: FormspreeConfig,

    /// Telegram bot settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Google Apps Script web-app settings.
    #[serde(default)]
    pub google_sheets: GoogleSheetsConfig,

    /// WhatsApp deep-link settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Popup suppression windows.
    #[serde(default)]
    pub popup: PopupConfig,

    /// Cache worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Site identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Business name used in subjects and sender fields.
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Origin the cache worker fronts, e.g. `http://127.0.0.1:8080`.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Mailbox that receives relayed leads.
    #[serde(default)]
    pub owner_email: Option<String>,

    /// Offset from UTC, in minutes, for human-readable dates in notifications.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            origin: default_origin(),
            log_level: default_log_level(),
            owner_email: None,
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

fn default_site_name() -> String {
    "sitekit".to_string()
}

fn default_origin() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_utc_offset_minutes() -> i32 {
    330
}

/// Lead pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeadsConfig {
    /// Channels tried in order until one accepts the lead.
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelKind>,

    /// Optional chat-bot notification fired after the chain, never awaited.
    #[serde(default)]
    pub notify: Option<ChannelKind>,

    /// Upper bound for a single channel attempt.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Maximum number of leads kept in the local log.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    /// Storage key of the local lead log.
    #[serde(default = "default_log_key")]
    pub log_key: String,
}

impl Default for LeadsConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            notify: None,
            attempt_timeout_secs: default_attempt_timeout_secs(),
            log_capacity: default_log_capacity(),
            log_key: default_log_key(),
        }
    }
}

fn default_channels() -> Vec<ChannelKind> {
    vec![ChannelKind::Web3forms]
}

fn default_attempt_timeout_secs() -> u64 {
    10
}

fn default_log_capacity() -> usize {
    30
}

fn default_log_key() -> String {
    "sitekit_leads".to_string()
}

/// Web3Forms configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Web3FormsConfig {
    /// Access key from the Web3Forms dashboard.
    #[serde(default)]
    pub access_key: Option<String>,

    #[serde(default = "default_web3forms_endpoint")]
    pub endpoint: String,
}

impl Default for Web3FormsConfig {
    fn default() -> Self {
        Self {
            access_key: None,
            endpoint: default_web3forms_endpoint(),
        }
    }
}

fn default_web3forms_endpoint() -> String {
    "https://api.web3forms.com/submit".to_string()
}

/// EmailJS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailJsConfig {
    #[serde(default)]
    pub service_id: Option<String>,

    #[serde(default)]
    pub template_id: Option<String>,

    #[serde(default)]
    pub public_key: Option<String>,

    /// Recipient address passed as the `to_email` template parameter.
    #[serde(default)]
    pub to_email: Option<String>,

    #[serde(default = "default_emailjs_endpoint")]
    pub endpoint: String,
}

impl Default for EmailJsConfig {
    fn default() -> Self {
        Self {
            service_id: None,
            template_id: None,
            public_key: None,
            to_email: None,
            endpoint: default_emailjs_endpoint(),
        }
    }
}

fn default_emailjs_endpoint() -> String {
    "https://api.emailjs.com/api/v1.0/email/send".to_string()
}

/// Formspree configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FormspreeConfig {
    #[serde(default)]
    pub form_id: Option<String>,

    /// Base URL; the form id is appended as a path segment.
    #[serde(default = "default_formspree_endpoint")]
    pub endpoint: String,
}

impl Default for FormspreeConfig {
    fn default() -> Self {
        Self {
            form_id: None,
            endpoint: default_formspree_endpoint(),
        }
    }
}

fn default_formspree_endpoint() -> String {
    "https://formspree.io/f".to_string()
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather. `None` disables Telegram.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Target user, group or channel id.
    #[serde(default)]
    pub chat_id: Option<String>,

    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: default_telegram_api_base(),
        }
    }
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

/// Google Apps Script configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GoogleSheetsConfig {
    /// Deployed web-app URL (`https://script.google.com/macros/s/<id>/exec`).
    #[serde(default)]
    pub script_url: Option<String>,
}

/// WhatsApp deep-link configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Number with country code, digits only.
    #[serde(default)]
    pub phone_number: Option<String>,

    /// When false the channel accepts leads without opening a chat link.
    #[serde(default = "default_true")]
    pub enable_direct_message: bool,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            phone_number: None,
            enable_direct_message: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Popup suppression configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PopupConfig {
    /// Days to stay hidden after the visitor dismissed the popup.
    #[serde(default = "default_dont_show_for_days")]
    pub dont_show_for_days: u32,

    /// Days to stay hidden after the visitor submitted the popup form.
    #[serde(default = "default_dont_show_after_submit_days")]
    pub dont_show_after_submit_days: u32,

    #[serde(default = "default_popup_storage_key")]
    pub storage_key: String,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            dont_show_for_days: default_dont_show_for_days(),
            dont_show_after_submit_days: default_dont_show_after_submit_days(),
            storage_key: default_popup_storage_key(),
        }
    }
}

fn default_dont_show_for_days() -> u32 {
    1
}

fn default_dont_show_after_submit_days() -> u32 {
    30
}

fn default_popup_storage_key() -> String {
    "sitekit_popup_status".to_string()
}

/// Cache worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Deployed version; part of the cache store name.
    #[serde(default = "default_worker_version")]
    pub version: String,

    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Page served to navigations when both network and cache miss.
    #[serde(default = "default_offline_url")]
    pub offline_url: String,

    /// Origin-relative paths fetched into the store during install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Activate right after install instead of waiting for clients to close.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            version: default_worker_version(),
            cache_prefix: default_cache_prefix(),
            offline_url: default_offline_url(),
            precache: default_precache(),
            skip_waiting: true,
        }
    }
}

impl WorkerConfig {
    /// Name of the cache store owned by this version.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.version)
    }
}

fn default_worker_version() -> String {
    "v1.0.0".to_string()
}

fn default_cache_prefix() -> String {
    "sitekit".to_string()
}

fn default_offline_url() -> String {
    "/offline.html".to_string()
}

fn default_precache() -> Vec<String> {
    vec![
        "/offline.html".to_string(),
        "/logo.png".to_string(),
        "/manifest.json".to_string(),
    ]
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("sitekit").join("sitekit.db"))
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sitekit.db".to_string())
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_host")]
    pub host: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required by `POST /__sitekit/push`. `None` disables push.
    #[serde(default)]
    pub push_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            push_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}
