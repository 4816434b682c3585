// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Submission outcome and the toast the page should show for it.

use serde::Serialize;
use sitekit_core::{DeliveryMethod, LeadId};

/// Result of one `submit` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    /// False only when the lead could not be written to the local log.
    pub success: bool,
    /// Winning channel, or `local` when every channel failed.
    pub method: DeliveryMethod,
    pub lead_id: LeadId,
    /// Channel-provided detail, e.g. a chat link the page should open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Warning,
    Error,
}

/// User-facing notification for a finished submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: &'static str,
    pub message: &'static str,
}

impl Toast {
    /// Shown instead of submitting when fields are rejected.
    pub fn validation() -> Self {
        Self {
            kind: ToastKind::Error,
            title: "Validation Error",
            message: "Please check the highlighted fields and try again.",
        }
    }
}

impl SubmitOutcome {
    pub fn toast(&self) -> Toast {
        match (self.success, self.method.is_local()) {
            (true, false) => Toast {
                kind: ToastKind::Success,
                title: "Message Sent!",
                message: "Thank you! We'll get back to you within 24 hours.",
            },
            (true, true) => Toast {
                kind: ToastKind::Warning,
                title: "Saved",
                message: "Your request has been saved. We'll contact you soon.",
            },
            (false, _) => Toast {
                kind: ToastKind::Error,
                title: "Submission Failed",
                message: "Please try again or contact us directly by phone or WhatsApp.",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(success: bool, method: DeliveryMethod) -> SubmitOutcome {
        SubmitOutcome {
            success,
            method,
            lead_id: LeadId("LEAD_X_1".into()),
            detail: None,
        }
    }

    #[test]
    fn toast_follows_outcome() {
        assert_eq!(
            outcome(true, DeliveryMethod::Channel("web3forms".into())).toast().kind,
            ToastKind::Success
        );
        let saved = outcome(true, DeliveryMethod::Local).toast();
        assert_eq!((saved.kind, saved.title), (ToastKind::Warning, "Saved"));
        let failed = outcome(false, DeliveryMethod::Channel("web3forms".into())).toast();
        assert_eq!(failed.title, "Submission Failed");
    }

    #[test]
    fn outcome_serializes_method_as_string() {
        let json = serde_json::to_value(outcome(true, DeliveryMethod::Local)).unwrap();
        assert_eq!(json["method"], "local");
        assert_eq!(json["lead_id"], "LEAD_X_1");
        assert!(json.get("detail").is_none());
    }
}
