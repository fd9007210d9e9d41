//! Mailer trigger event
//!
//! The mailer is driven by the completion event published after an export
//! run. It also accepts the older single-object "Object Created" storage
//! notification so a report dropped into the bucket by hand can still be sent.

use crate::domain::report::ReportKind;
use crate::domain::{Result, VigilError};
use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Artifact reference as carried by the trigger
///
/// Every field is optional on the wire; missing storage references are
/// reported as per-artifact failures by the attachment pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    #[serde(default)]
    pub report_kind: Option<ReportKind>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub byte_size: Option<u64>,
}

/// Address list accepted either as `"a@x, b@y"` or as `["a@x", "b@y"]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRecipientList")]
pub struct RecipientList(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecipientList {
    Joined(String),
    Entries(Vec<String>),
}

impl From<RawRecipientList> for RecipientList {
    fn from(raw: RawRecipientList) -> Self {
        let entries = match raw {
            RawRecipientList::Joined(s) => s.split(',').map(str::to_string).collect(),
            RawRecipientList::Entries(v) => v,
        };
        RecipientList(
            entries
                .into_iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        )
    }
}

impl RecipientList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma-joined form, suitable for address-list parsing
    pub fn joined(&self) -> String {
        self.0.join(",")
    }
}

/// Parsed mailer input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailerTrigger {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactDescriptor>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub test_mode: bool,
    #[serde(default)]
    pub test_to_emails: Option<RecipientList>,
    #[serde(default)]
    pub test_cc_emails: Option<RecipientList>,
}

impl MailerTrigger {
    /// Parse a trigger from raw event JSON
    ///
    /// Accepts the event-bus envelope (payload under `detail`), a bare
    /// payload, or a storage "Object Created" notification.
    pub fn from_event(event: Value) -> Result<Self> {
        let detail = match event {
            Value::Object(mut map) if map.contains_key("detail") => {
                map.remove("detail").unwrap_or(Value::Null)
            }
            other => other,
        };

        if let Some(trigger) = Self::from_object_created(&detail) {
            return Ok(trigger);
        }

        serde_json::from_value(detail)
            .map_err(|e| VigilError::Validation(format!("Invalid mailer trigger: {e}")))
    }

    /// Parse a trigger from a JSON string
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_event(value)
    }

    fn from_object_created(detail: &Value) -> Option<Self> {
        let bucket = detail.pointer("/bucket/name")?.as_str()?.to_string();
        let raw_key = detail.pointer("/object/key")?.as_str()?;
        let key = decode_object_key(raw_key);
        let byte_size = detail.pointer("/object/size").and_then(Value::as_u64);

        Some(Self {
            bucket: Some(bucket.clone()),
            artifacts: vec![ArtifactDescriptor {
                report_kind: None,
                bucket: Some(bucket),
                key: Some(key),
                file_name: None,
                byte_size,
            }],
            ..Default::default()
        })
    }
}

/// Decode a storage notification key (`+` for space, `%XX` escapes)
///
/// `+` is replaced before percent-decoding so an escaped `%2B` stays a plus.
pub fn decode_object_key(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}
