// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the sitekit crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    Network,
    Observability,
}

// --- Leads ---

/// Opaque identifier shared by every delivery attempt of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which form produced a lead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FormType {
    Contact,
    PopupConsultation,
    WelcomePopup,
    QuoteRequest,
}

impl FormType {
    /// Human-readable label used in notification subjects.
    pub fn label(&self) -> &'static str {
        match self {
            FormType::Contact => "Contact",
            FormType::PopupConsultation => "Popup Consultation",
            FormType::WelcomePopup => "Welcome Popup",
            FormType::QuoteRequest => "Quote Request",
        }
    }

    /// Popup forms also ask which service the visitor is interested in.
    pub fn requires_service(&self) -> bool {
        matches!(self, FormType::PopupConsultation | FormType::WelcomePopup)
    }
}

/// Built-in delivery channel variants, selectable by name in configuration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Web3forms,
    Emailjs,
    Formspree,
    Telegram,
    GoogleSheets,
    Whatsapp,
}

/// Page context captured when the form was submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub url: String,
    pub page: String,
    pub referrer: String,
    pub user_agent: String,
    #[serde(default)]
    pub screen_size: Option<String>,
    pub timestamp: String,
}

/// A normalized, enriched form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub lead_id: LeadId,
    pub form_type: FormType,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub context: PageContext,
}

/// Successful delivery report from a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Channel that accepted the lead.
    pub channel: String,
    /// Provider-specific detail (message id, response text).
    pub detail: Option<String>,
}

impl DeliveryReceipt {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// How a submission was ultimately recorded.
///
/// Serialized as a bare string: the channel name, or `local`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeliveryMethod {
    Channel(String),
    Local,
}

impl DeliveryMethod {
    pub const LOCAL: &'static str = "local";

    pub fn is_local(&self) -> bool {
        matches!(self, DeliveryMethod::Local)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeliveryMethod::Channel(name) => name,
            DeliveryMethod::Local => Self::LOCAL,
        }
    }
}

impl From<String> for DeliveryMethod {
    fn from(value: String) -> Self {
        if value == Self::LOCAL {
            DeliveryMethod::Local
        } else {
            DeliveryMethod::Channel(value)
        }
    }
}

impl From<DeliveryMethod> for String {
    fn from(value: DeliveryMethod) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Fetch ---

/// Request mode, mirroring the browser fetch `mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMode {
    /// Top-level document navigation.
    Navigate,
    SameOrigin,
    Cors,
    NoCors,
}

/// What the response will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    Other,
}

impl Destination {
    /// Map a `Sec-Fetch-Dest` header value.
    pub fn from_sec_fetch_dest(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" | "iframe" | "frame" => Destination::Document,
            "script" | "worker" | "sharedworker" | "serviceworker" => Destination::Script,
            "style" => Destination::Style,
            "image" => Destination::Image,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            _ => Destination::Other,
        }
    }
}

/// A request as seen by the cache worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Upper-case HTTP method.
    pub method: String,
    /// Absolute URL.
    pub url: String,
    pub mode: RequestMode,
    pub destination: Destination,
    pub headers: Vec<(String, String)>,
    /// Request body; empty for `GET`.
    pub body: Vec<u8>,
}

impl FetchRequest {
    /// A plain same-origin GET.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            mode: RequestMode::SameOrigin,
            destination: Destination::Other,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// A top-level navigation GET.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            mode: RequestMode::Navigate,
            destination: Destination::Document,
            ..Self::get(url)
        }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Key under which the response is cached: the URL without its fragment.
    pub fn cache_key(&self) -> &str {
        match self.url.find('#') {
            Some(pos) => &self.url[..pos],
            None => &self.url,
        }
    }
}

/// A response produced by the network or read back from a cache store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Only complete `200 OK` responses are written to a cache store.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }
}

// --- Worker messaging ---

/// Structured messages exchanged between pages and the cache worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Page → worker: activate the waiting worker now.
    SkipWaiting,
    /// Worker → pages: a new cache version is live.
    CacheUpdated { version: String },
    /// Worker → pages: a new worker replaced a previous version.
    SwUpdated { version: String },
    /// Worker → pages: show a notification; clicking it opens `url`.
    Notification {
        title: String,
        body: String,
        url: String,
    },
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn form_type_parses_snake_case() {
        assert_eq!(
            FormType::from_str("popup_consultation").unwrap(),
            FormType::PopupConsultation
        );
        assert_eq!(FormType::QuoteRequest.to_string(), "quote_request");
        assert!(FormType::from_str("newsletter").is_err());
    }

    #[test]
    fn only_popup_forms_require_service() {
        assert!(FormType::WelcomePopup.requires_service());
        assert!(FormType::PopupConsultation.requires_service());
        assert!(!FormType::Contact.requires_service());
        assert!(!FormType::QuoteRequest.requires_service());
    }

    #[test]
    fn channel_kind_names_match_config_spelling() {
        assert_eq!(ChannelKind::GoogleSheets.to_string(), "google_sheets");
        let parsed: ChannelKind = serde_json::from_str("\"web3forms\"").unwrap();
        assert_eq!(parsed, ChannelKind::Web3forms);
    }

    #[test]
    fn delivery_method_serializes_as_bare_string() {
        let json = serde_json::to_string(&DeliveryMethod::Local).unwrap();
        assert_eq!(json, "\"local\"");
        let parsed: DeliveryMethod = serde_json::from_str("\"telegram\"").unwrap();
        assert_eq!(parsed, DeliveryMethod::Channel("telegram".into()));
    }

    #[test]
    fn lead_flattens_page_context() {
        let lead = Lead {
            lead_id: LeadId("LEAD_X_1".into()),
            form_type: FormType::Contact,
            name: "A".into(),
            email: "a@b.com".into(),
            phone: "9999999999".into(),
            service: None,
            message: None,
            context: PageContext {
                url: "https://example.com/contact".into(),
                page: "Contact".into(),
                referrer: "Direct".into(),
                user_agent: "test".into(),
                screen_size: Some("1920x1080".into()),
                timestamp: "2026-01-01T00:00:00Z".into(),
            },
        };
        let value = serde_json::to_value(&lead).unwrap();
        assert_eq!(value["lead_id"], "LEAD_X_1");
        assert_eq!(value["form_type"], "contact");
        assert_eq!(value["referrer"], "Direct");
        let back: Lead = serde_json::from_value(value).unwrap();
        assert_eq!(back, lead);
    }

    #[test]
    fn worker_messages_use_type_tag() {
        let skip: WorkerMessage = serde_json::from_str(r#"{"type":"SKIP_WAITING"}"#).unwrap();
        assert_eq!(skip, WorkerMessage::SkipWaiting);

        let updated = WorkerMessage::SwUpdated {
            version: "v2".into(),
        };
        assert_eq!(
            serde_json::to_string(&updated).unwrap(),
            r#"{"type":"SW_UPDATED","version":"v2"}"#
        );
    }

    #[test]
    fn cache_key_drops_fragment() {
        let req = FetchRequest::get("https://site.test/about.html#team");
        assert_eq!(req.cache_key(), "https://site.test/about.html");
    }

    #[test]
    fn sec_fetch_dest_mapping() {
        assert_eq!(Destination::from_sec_fetch_dest("iframe"), Destination::Document);
        assert_eq!(Destination::from_sec_fetch_dest("FONT"), Destination::Font);
        assert_eq!(Destination::from_sec_fetch_dest("empty"), Destination::Other);
    }
}
