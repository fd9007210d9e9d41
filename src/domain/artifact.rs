//! Resolved report artifacts and the completion bundle
//!
//! A [`ResolvedArtifact`] exists only once a job succeeded and exactly one
//! object was located under its destination prefix. All artifacts of one run
//! travel together as a [`CompletionBundle`].

use crate::domain::ids::ReportId;
use crate::domain::report::ReportKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A located report file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    pub report_kind: ReportKind,
    pub report_id: ReportId,
    pub bucket: String,
    #[serde(rename = "key")]
    pub object_key: String,
    pub file_name: String,
    pub byte_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedArtifact {
    /// Whether the object key lies under the given prefix
    pub fn is_under(&self, prefix: &str) -> bool {
        self.object_key.starts_with(prefix)
    }
}

/// Every artifact resolved by one export run
///
/// Serialized as the `detail` of the completion event and read back by the
/// mailer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionBundle {
    pub run_id: Uuid,
    pub bucket: String,
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub environment: String,
    pub period: String,
    pub generated_at: DateTime<Utc>,
    pub artifacts: Vec<ResolvedArtifact>,
}

impl CompletionBundle {
    pub fn new(
        bucket: impl Into<String>,
        account_id: impl Into<String>,
        environment: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            bucket: bucket.into(),
            account_id: account_id.into(),
            region: None,
            environment: environment.into(),
            period: period.into(),
            generated_at: Utc::now(),
            artifacts: Vec::new(),
        }
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn push(&mut self, artifact: ResolvedArtifact) {
        self.artifacts.push(artifact);
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Storage ARNs of every artifact, used as event resources
    pub fn resource_arns(&self) -> Vec<String> {
        self.artifacts
            .iter()
            .map(|a| format!("arn:aws:s3:::{}/{}", a.bucket, a.object_key))
            .collect()
    }
}
