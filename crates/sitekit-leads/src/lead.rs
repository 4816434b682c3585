// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead construction: identifiers, field extraction, page context enrichment.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use sitekit_core::{FormType, Lead, LeadId, PageContext};

/// Raw form fields, name → trimmed value.
pub type FormFields = BTreeMap<String, String>;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Referrer recorded when the browser sent none.
pub const DIRECT_REFERRER: &str = "Direct";

/// Upper-case base-36 rendering of an unsigned integer.
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// `LEAD_<millis base36>_<5 random base36>`, generated once per submission.
pub fn generate_lead_id(now: DateTime<Utc>) -> LeadId {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    LeadId(format!("LEAD_{}_{suffix}", to_base36(millis)))
}

/// Non-empty value of a field, if present.
pub fn field<'a>(fields: &'a FormFields, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Build the enriched, immutable lead handed to every channel.
///
/// Missing `referrer` becomes `Direct`; an empty `timestamp` is filled with
/// `now` in RFC 3339.
pub fn build_lead(
    fields: &FormFields,
    form_type: FormType,
    mut context: PageContext,
    now: DateTime<Utc>,
) -> Lead {
    if context.referrer.trim().is_empty() {
        context.referrer = DIRECT_REFERRER.to_string();
    }
    if context.timestamp.trim().is_empty() {
        context.timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    }

    Lead {
        lead_id: generate_lead_id(now),
        form_type,
        name: field(fields, "name").unwrap_or_default().to_string(),
        email: field(fields, "email").unwrap_or_default().to_string(),
        phone: field(fields, "phone").unwrap_or_default().to_string(),
        service: field(fields, "service").map(str::to_string),
        message: field(fields, "message").map(str::to_string),
        context,
    }
}

/// Submission time of a lead, falling back to now for unparseable stamps.
pub fn submitted_at(lead: &Lead) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&lead.context.timestamp)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::TimeZone;

    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn base36_matches_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
    }

    #[test]
    fn lead_id_has_expected_shape() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let id = generate_lead_id(now);
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "LEAD");
        assert_eq!(parts[1], "LOYW3V28");
        assert_eq!(parts[2].len(), 5);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn lead_ids_are_unique_within_one_millisecond() {
        let now = Utc::now();
        let ids: HashSet<LeadId> = (0..100).map(|_| generate_lead_id(now)).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn build_lead_fills_defaults() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let lead = build_lead(
            &fields(&[
                ("name", "A"),
                ("email", "a@b.com"),
                ("phone", "9999999999"),
                ("service", "  "),
            ]),
            FormType::Contact,
            PageContext::default(),
            now,
        );
        assert_eq!(lead.name, "A");
        assert_eq!(lead.service, None);
        assert_eq!(lead.message, None);
        assert_eq!(lead.context.referrer, "Direct");
        assert_eq!(lead.context.timestamp, "2023-11-14T22:13:20.000Z");
        assert_eq!(submitted_at(&lead), now);
    }
}
