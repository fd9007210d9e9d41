//! Message composition

use super::recipients::RecipientSet;
use crate::config::MailConfig;
use crate::domain::{Attachment, EmailAddress, OutboundMessage, Result, VigilError};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Shown when at least one attachment was zipped
pub const COMPRESSED_NOTE: &str = "Note: some reports exceeded the email size limit and were \
compressed. Extract the .zip attachments to open the CSV files.";

/// Facts about the report carried into subject, body and metadata
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    pub report_date: Option<NaiveDate>,
    pub environment: Option<String>,
    pub object_keys: Vec<String>,
}

/// Assemble the outbound message
///
/// # Errors
///
/// Returns [`VigilError::Configuration`] when the sender address is missing
/// or malformed.
pub fn compose_message(
    config: &MailConfig,
    recipients: &RecipientSet,
    attachments: Vec<Attachment>,
    ctx: &MessageContext,
) -> Result<OutboundMessage> {
    let from_email = EmailAddress::new(config.from_email.as_str())
        .map_err(|e| VigilError::Configuration(format!("mail.from_email: {e}")))?;

    let date = ctx
        .report_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown date".to_string());

    let mut subject = format!("Inspector Report - {date}");
    if recipients.test_mode {
        subject.insert_str(0, "[TEST] ");
    }

    let mut metadata = BTreeMap::new();
    metadata.insert("report_date".to_string(), date.clone());
    if let Some(environment) = &ctx.environment {
        metadata.insert("environment".to_string(), environment.clone());
    }
    if !ctx.object_keys.is_empty() {
        metadata.insert("s3_key".to_string(), ctx.object_keys.join(","));
    }

    Ok(OutboundMessage {
        from_email,
        from_name: config.from_name.clone().filter(|n| !n.trim().is_empty()),
        to: recipients.to_recipients(),
        subject,
        text: body_text(config, &date, &attachments),
        tags: config.tags.clone(),
        metadata,
        attachments,
    })
}

fn body_text(config: &MailConfig, date: &str, attachments: &[Attachment]) -> String {
    let mut text = String::from("Hello,\n\n");
    let _ = writeln!(
        text,
        "Please find attached the AWS Inspector findings report for {date}."
    );
    text.push_str("\nAttached files:\n");
    for attachment in attachments {
        let _ = writeln!(text, "- {}", attachment.name);
    }

    if attachments.iter().any(|a| a.compressed) {
        text.push('\n');
        text.push_str(COMPRESSED_NOTE);
        text.push('\n');
    }

    let _ = write!(text, "\nBest regards,\n{}", config.signature);
    text
}
