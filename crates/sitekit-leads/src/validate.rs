// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field-level validation run before a submission enters the pipeline.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use sitekit_core::FormType;

use crate::lead::{field, FormFields};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?\(?[0-9]{3}\)?[-\s.]?[0-9]{3}[-\s.]?[0-9]{4,6}$").expect("valid phone regex")
});

/// Minimum length of the `name` field, in characters.
const MIN_NAME_CHARS: usize = 2;

/// One rejected field and the message shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

/// Whitespace is ignored, so `98765 43210` is accepted.
pub fn is_valid_phone(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE.is_match(&compact)
}

/// Check every field of a submission, reporting all problems at once.
pub fn validate_submission(fields: &FormFields, form_type: FormType) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    match field(fields, "name") {
        Some(name) if name.chars().count() >= MIN_NAME_CHARS => {}
        _ => errors.push(FieldError {
            field: "name",
            message: "Please enter your name (at least 2 characters)",
        }),
    }

    match field(fields, "email") {
        None => errors.push(FieldError {
            field: "email",
            message: "Please enter your email address",
        }),
        Some(email) if !is_valid_email(email) => errors.push(FieldError {
            field: "email",
            message: "Please enter a valid email address",
        }),
        Some(_) => {}
    }

    match field(fields, "phone") {
        None => errors.push(FieldError {
            field: "phone",
            message: "Please enter your phone number",
        }),
        Some(phone) if !is_valid_phone(phone) => errors.push(FieldError {
            field: "phone",
            message: "Please enter a valid phone number",
        }),
        Some(_) => {}
    }

    if form_type.requires_service() && field(fields, "service").is_none() {
        errors.push(FieldError {
            field: "service",
            message: "Please select a service",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
