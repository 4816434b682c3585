// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared sample data.

use sitekit_core::{FormType, Lead, LeadId, PageContext};
use sitekit_leads::FormFields;

/// Origin used by worker tests; never resolved.
pub const TEST_ORIGIN: &str = "https://site.test";

/// Valid contact-form fields.
pub fn sample_fields() -> FormFields {
    [
        ("name", "Asha Verma"),
        ("email", "asha@example.com"),
        ("phone", "+91 98765 43210"),
        ("message", "Looking for a quote on a kitchen remodel"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// A fully built contact lead.
pub fn sample_lead() -> Lead {
    Lead {
        lead_id: LeadId("LEAD_MF1ZQ0_TEST1".into()),
        form_type: FormType::Contact,
        name: "Asha Verma".into(),
        email: "asha@example.com".into(),
        phone: "+91 98765 43210".into(),
        service: None,
        message: Some("Looking for a quote on a kitchen remodel".into()),
        context: PageContext {
            url: format!("{TEST_ORIGIN}/contact.html"),
            page: "Contact".into(),
            referrer: "Direct".into(),
            user_agent: "sitekit-tests".into(),
            screen_size: Some("1440x900".into()),
            timestamp: "2026-10-18T09:30:00.000Z".into(),
        },
    }
}
