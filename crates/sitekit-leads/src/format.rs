// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable lead summaries for chat channels and email bodies.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use sitekit_core::Lead;

use crate::lead::submitted_at;

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━";
const SOURCE_LINE: &str = "Source: Website Form";

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders leads in the site's local time.
#[derive(Debug, Clone, Copy)]
pub struct MessageFormatter {
    offset: FixedOffset,
}

impl MessageFormatter {
    /// Out-of-range offsets fall back to UTC.
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    pub fn title(lead: &Lead) -> String {
        format!("New {} Form Submission", lead.form_type.label().to_uppercase())
    }

    /// `18/10/2026, 03:45:12 PM` in the configured offset.
    pub fn display_date(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format("%d/%m/%Y, %I:%M:%S %p")
            .to_string()
    }

    /// WhatsApp summary using `*bold*` markers.
    pub fn whatsapp(&self, lead: &Lead) -> String {
        let mut lines = vec![
            format!("*{}*", Self::title(lead)),
            DIVIDER.to_string(),
            format!("*Name:* {}", lead.name),
            format!("*Phone:* {}", lead.phone),
            format!("*Email:* {}", lead.email),
        ];
        if let Some(service) = &lead.service {
            lines.push(format!("*Service:* {service}"));
        }
        if let Some(message) = &lead.message {
            lines.push(format!("*Message:* {message}"));
        }
        lines.push(DIVIDER.to_string());
        lines.push(format!("*Date:* {}", self.display_date(submitted_at(lead))));
        lines.push(format!("_{SOURCE_LINE}_"));
        lines.join("\n")
    }

    /// Telegram summary in HTML parse mode; every user value is escaped.
    pub fn telegram_html(&self, lead: &Lead) -> String {
        let mut lines = vec![
            format!("<b>{}</b>", escape_html(&Self::title(lead))),
            DIVIDER.to_string(),
            format!("<b>Name:</b> {}", escape_html(&lead.name)),
            format!("<b>Phone:</b> {}", escape_html(&lead.phone)),
            format!("<b>Email:</b> {}", escape_html(&lead.email)),
        ];
        if let Some(service) = &lead.service {
            lines.push(format!("<b>Service:</b> {}", escape_html(service)));
        }
        if let Some(message) = &lead.message {
            lines.push(format!("<b>Message:</b> {}", escape_html(message)));
        }
        lines.push(DIVIDER.to_string());
        lines.push(format!(
            "<b>Date:</b> {}",
            escape_html(&self.display_date(submitted_at(lead)))
        ));
        lines.push(format!("<i>{SOURCE_LINE}</i>"));
        lines.join("\n")
    }

    /// Plain-text body for email relays.
    pub fn plain(&self, lead: &Lead) -> String {
        let mut lines = vec![
            Self::title(lead),
            String::new(),
            format!("Name: {}", lead.name),
            format!("Phone: {}", lead.phone),
            format!("Email: {}", lead.email),
        ];
        if let Some(service) = &lead.service {
            lines.push(format!("Service: {service}"));
        }
        if let Some(message) = &lead.message {
            lines.push(format!("Message: {message}"));
        }
        lines.push(String::new());
        lines.push(format!("Page: {}", lead.context.url));
        lines.push(format!("Referrer: {}", lead.context.referrer));
        lines.push(format!("Date: {}", self.display_date(submitted_at(lead))));
        lines.push(format!("Lead ID: {}", lead.lead_id));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use sitekit_core::{FormType, LeadId, PageContext};

    use super::*;

    fn lead() -> Lead {
        Lead {
            lead_id: LeadId("LEAD_TEST_00001".into()),
            form_type: FormType::PopupConsultation,
            name: "Tom & \"Jerry\"".into(),
            email: "tj@example.com".into(),
            phone: "9999999999".into(),
            service: Some("SEO <audit>".into()),
            message: None,
            context: PageContext {
                url: "https://site.test/".into(),
                referrer: "Direct".into(),
                timestamp: "2026-10-18T10:15:30.000Z".into(),
                ..PageContext::default()
            },
        }
    }

    #[test]
    fn escapes_all_html_specials() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#039;&amp;&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn date_uses_configured_offset() {
        let formatter = MessageFormatter::new(330);
        let at = submitted_at(&lead());
        assert_eq!(formatter.display_date(at), "18/10/2026, 03:45:30 PM");
        assert_eq!(MessageFormatter::new(0).display_date(at), "18/10/2026, 10:15:30 AM");
    }

    #[test]
    fn whatsapp_summary_lists_present_fields() {
        let text = MessageFormatter::new(330).whatsapp(&lead());
        assert!(text.starts_with("*New POPUP CONSULTATION Form Submission*"));
        assert!(text.contains("*Service:* SEO <audit>"));
        assert!(!text.contains("*Message:*"));
        assert!(text.ends_with("_Source: Website Form_"));
    }

    #[test]
    fn telegram_summary_escapes_user_values() {
        let text = MessageFormatter::new(330).telegram_html(&lead());
        assert!(text.contains("<b>Name:</b> Tom &amp; &quot;Jerry&quot;"));
        assert!(text.contains("<b>Service:</b> SEO &lt;audit&gt;"));
    }
}
