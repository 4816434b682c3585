// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sitekit submit` and `sitekit leads ...`.

use std::sync::Arc;

use colored::Colorize;
use sitekit_config::SitekitConfig;
use sitekit_core::{PageContext, SitekitError};
use sitekit_leads::{
    FormFields, LeadPipeline, StoredLead, ToastKind, TracingLauncher, validate_submission,
};

use crate::SubmitArgs;
use crate::serve::open_storage;

async fn pipeline(config: &SitekitConfig) -> Result<LeadPipeline, SitekitError> {
    let storage = open_storage(config).await?;
    LeadPipeline::from_config(config, storage, Arc::new(TracingLauncher))
}

/// Collect the CLI arguments into the same field map the web form produces.
pub(crate) fn fields_from_args(args: &SubmitArgs) -> FormFields {
    let mut fields = FormFields::new();
    let pairs = [
        ("name", Some(&args.name)),
        ("email", Some(&args.email)),
        ("phone", Some(&args.phone)),
        ("service", args.service.as_ref()),
        ("message", args.message.as_ref()),
    ];
    for (key, value) in pairs {
        if let Some(value) = value {
            fields.insert(key.to_string(), value.trim().to_string());
        }
    }
    fields
}

pub async fn run_submit(config: &SitekitConfig, args: SubmitArgs) -> Result<(), SitekitError> {
    let fields = fields_from_args(&args);
    if let Err(errors) = validate_submission(&fields, args.form_type) {
        for e in &errors {
            eprintln!("  {} {}: {}", "x".red(), e.field.bold(), e.message);
        }
        return Err(SitekitError::Config(format!(
            "{} field(s) failed validation",
            errors.len()
        )));
    }

    let pipeline = pipeline(config).await?;
    let context = PageContext {
        page: args.page.clone().unwrap_or_else(|| "cli".to_string()),
        ..PageContext::default()
    };
    let outcome = pipeline
        .submit_with_context(&fields, args.form_type, context)
        .await;
    pipeline.flush_notifications().await;

    if args.json {
        let rendered = serde_json::to_string_pretty(&outcome)
            .map_err(|e| SitekitError::Internal(format!("cannot render outcome: {e}")))?;
        println!("{rendered}");
    } else {
        let toast = outcome.toast();
        let title = match toast.kind {
            ToastKind::Success => toast.title.green().bold(),
            ToastKind::Warning => toast.title.yellow().bold(),
            ToastKind::Error => toast.title.red().bold(),
        };
        println!("{title} {}", toast.message);
        println!("  lead:   {}", outcome.lead_id.0);
        println!("  method: {}", outcome.method.as_str());
        if let Some(detail) = &outcome.detail {
            println!("  detail: {detail}");
        }
    }

    if outcome.success {
        Ok(())
    } else {
        Err(SitekitError::Internal("lead was not saved".to_string()))
    }
}

pub async fn run_list(config: &SitekitConfig, pending_only: bool, json: bool) -> Result<(), SitekitError> {
    let pipeline = pipeline(config).await?;
    let entries = if pending_only {
        pipeline.log().pending().await?
    } else {
        pipeline.log().entries().await?
    };

    if json {
        let rendered = serde_json::to_string_pretty(&entries)
            .map_err(|e| SitekitError::Internal(format!("cannot render leads: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("No leads stored.");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", render_entry(entry));
    }
    println!(
        "\n{} of {} slots used",
        entries.len(),
        pipeline.log().capacity()
    );
    Ok(())
}

fn render_entry(entry: &StoredLead) -> String {
    let method = if entry.is_pending() {
        entry.method.as_str().yellow()
    } else {
        entry.method.as_str().green()
    };
    format!(
        "{}  {}  {:<18}  {} <{}>  [{}]",
        entry.saved_at,
        entry.lead.lead_id.0.dimmed(),
        entry.lead.form_type.label(),
        entry.lead.name,
        entry.lead.email,
        method
    )
}

pub async fn run_sync(config: &SitekitConfig) -> Result<(), SitekitError> {
    let pipeline = pipeline(config).await?;
    let report = pipeline.sync_pending().await?;
    pipeline.flush_notifications().await;
    println!(
        "sitekit: delivered {} of {} pending lead(s)",
        report.delivered, report.attempted
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitekit_core::FormType;

    fn args() -> SubmitArgs {
        SubmitArgs {
            form_type: FormType::Contact,
            name: "  Asha ".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            service: None,
            message: Some("Hello".to_string()),
            page: None,
            json: false,
        }
    }

    #[test]
    fn fields_skip_absent_options_and_trim() {
        let fields = fields_from_args(&args());
        assert_eq!(fields.get("name").map(String::as_str), Some("Asha"));
        assert_eq!(fields.get("message").map(String::as_str), Some("Hello"));
        assert!(!fields.contains_key("service"));
    }

    #[test]
    fn cli_fields_pass_contact_validation() {
        let fields = fields_from_args(&args());
        assert!(validate_submission(&fields, FormType::Contact).is_ok());
    }
}
