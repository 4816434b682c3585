// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead submission for sitekit.
//!
//! Validated form fields become a [`Lead`](sitekit_core::Lead) with a fresh
//! identifier and page context, are offered to the configured delivery
//! channels in priority order, and always land in the local lead log.

pub mod channels;
pub mod format;
pub mod lead;
pub mod log;
pub mod outcome;
pub mod pipeline;
pub mod popup;
pub mod registry;
pub mod validate;

pub use channels::{LinkLauncher, TracingLauncher};
pub use lead::{build_lead, generate_lead_id, FormFields};
pub use log::{LeadLog, StoredLead};
pub use outcome::{SubmitOutcome, Toast, ToastKind};
pub use pipeline::{LeadPipeline, SyncReport};
pub use popup::{is_valid_visitor, PopupGate, PopupStatus, MAX_VISITOR_LEN};
pub use registry::{build_channels, ChannelSet};
pub use validate::{validate_submission, FieldError};
