//! Outbound mail model
//!
//! Attachments, recipients, the message handed to the transport and the
//! per-recipient delivery outcomes it returns.

use crate::domain::ids::EmailAddress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Media type for uncompressed CSV reports
pub const CSV_MEDIA_TYPE: &str = "text/csv";

/// Media type for compressed reports
pub const ZIP_MEDIA_TYPE: &str = "application/zip";

/// File name suffix for compressed reports
pub const ZIP_SUFFIX: &str = ".zip";

/// A ready-to-send attachment
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub media_type: String,
    pub name: String,
    /// Base64 payload
    pub content: String,
    #[serde(skip)]
    pub compressed: bool,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("media_type", &self.media_type)
            .field("name", &self.name)
            .field("content_len", &self.content.len())
            .field("compressed", &self.compressed)
            .finish()
    }
}

/// Recipient role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    To,
    Cc,
}

/// One recipient entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: EmailAddress,
    #[serde(rename = "type")]
    pub kind: RecipientKind,
}

impl Recipient {
    pub fn to(email: EmailAddress) -> Self {
        Self {
            email,
            kind: RecipientKind::To,
        }
    }

    pub fn cc(email: EmailAddress) -> Self {
        Self {
            email,
            kind: RecipientKind::Cc,
        }
    }
}

/// A complete message ready for the transport
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub from_email: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    pub to: Vec<Recipient>,
    pub subject: String,
    pub text: String,
    pub tags: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub attachments: Vec<Attachment>,
}

/// Provider verdict for one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Queued,
    Scheduled,
    Rejected,
    Invalid,
    #[serde(other)]
    Other,
}

impl DeliveryStatus {
    /// Whether the provider accepted the message for this recipient
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::Sent | DeliveryStatus::Queued | DeliveryStatus::Scheduled
        )
    }
}

/// Delivery result for one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub email: String,
    pub status: DeliveryStatus,
    #[serde(rename = "_id", default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub reject_reason: Option<String>,
}

impl DeliveryOutcome {
    /// Log this outcome at a severity matching its status
    pub fn log(&self) {
        match self.status {
            DeliveryStatus::Sent | DeliveryStatus::Queued | DeliveryStatus::Scheduled => {
                tracing::info!(
                    email = %self.email,
                    status = ?self.status,
                    provider_id = ?self.provider_id,
                    "Report email accepted for recipient"
                );
            }
            DeliveryStatus::Rejected => {
                tracing::warn!(
                    email = %self.email,
                    provider_id = ?self.provider_id,
                    reject_reason = ?self.reject_reason,
                    "Report email rejected for recipient"
                );
            }
            DeliveryStatus::Invalid | DeliveryStatus::Other => {
                tracing::error!(
                    email = %self.email,
                    status = ?self.status,
                    provider_id = ?self.provider_id,
                    reject_reason = ?self.reject_reason,
                    "Report email could not be delivered to recipient"
                );
            }
        }
    }
}
