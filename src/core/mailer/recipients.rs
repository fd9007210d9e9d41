//! Recipient resolution
//!
//! Normal runs mail the configured lists. Test runs mail only the override
//! lists carried by the trigger and never fall back to the configured ones.

use crate::config::MailConfig;
use crate::domain::ids::parse_address_list;
use crate::domain::{EmailAddress, MailerTrigger, Recipient, Result, VigilError};

/// Resolved primary and copy recipients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientSet {
    pub to: Vec<EmailAddress>,
    pub cc: Vec<EmailAddress>,
    pub test_mode: bool,
}

impl RecipientSet {
    /// Flatten into wire recipients, primary recipients first
    pub fn to_recipients(&self) -> Vec<Recipient> {
        self.to
            .iter()
            .cloned()
            .map(Recipient::to)
            .chain(self.cc.iter().cloned().map(Recipient::cc))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.to.len() + self.cc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to.is_empty() && self.cc.is_empty()
    }
}

/// Pick the recipients for a trigger
///
/// # Errors
///
/// Returns [`VigilError::Configuration`] when no primary recipient is
/// available or an address is malformed.
pub fn resolve_recipients(config: &MailConfig, trigger: &MailerTrigger) -> Result<RecipientSet> {
    let (to_raw, cc_raw) = if trigger.test_mode {
        let to = trigger
            .test_to_emails
            .as_ref()
            .map(|list| list.joined())
            .unwrap_or_default();
        if to.trim().is_empty() {
            return Err(VigilError::Configuration(
                "Test mode requires at least one test_to_emails recipient".to_string(),
            ));
        }
        let cc = trigger
            .test_cc_emails
            .as_ref()
            .map(|list| list.joined())
            .unwrap_or_default();
        (to, cc)
    } else {
        (config.to_emails.clone(), config.cc_emails.clone())
    };

    let to = parse_address_list(&to_raw).map_err(VigilError::Configuration)?;
    let cc = parse_address_list(&cc_raw).map_err(VigilError::Configuration)?;

    if to.is_empty() {
        return Err(VigilError::Configuration(
            "No recipients configured: set mail.to_emails".to_string(),
        ));
    }

    Ok(RecipientSet {
        to,
        cc,
        test_mode: trigger.test_mode,
    })
}
