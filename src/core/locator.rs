//! Artifact locator
//!
//! The scanning service reports only the prefix it wrote under, never the
//! final object name. The locator lists that prefix and picks the newest
//! report file.

use crate::adapters::{ObjectStore, ObjectSummary};
use crate::domain::{ExportJob, ResolvedArtifact, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Newest object directly inside the `prefix` directory whose key ends with
/// `suffix`
///
/// Keys in nested folders are skipped, so a full-month prefix never picks up
/// a split report written below it. Ties on modification time are broken by
/// key, so the choice is stable for a given object set. Objects without a
/// timestamp rank oldest.
pub fn select_latest<'a>(
    objects: &'a [ObjectSummary],
    prefix: &str,
    suffix: &str,
) -> Option<&'a ObjectSummary> {
    let prefix = directory_prefix(prefix);
    objects
        .iter()
        .filter(|o| {
            o.key
                .strip_prefix(prefix.as_str())
                .is_some_and(|name| !name.contains('/') && name.ends_with(suffix))
        })
        .max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.key.cmp(&b.key))
        })
}

/// Resolves finished jobs to concrete report objects
pub struct ArtifactLocator {
    store: Arc<dyn ObjectStore>,
    suffix: String,
}

impl ArtifactLocator {
    pub fn new(store: Arc<dyn ObjectStore>, suffix: impl Into<String>) -> Self {
        Self {
            store,
            suffix: suffix.into(),
        }
    }

    /// Locate the report written for `job` under `bucket`/`prefix`
    ///
    /// Returns `Ok(None)` when the prefix holds no matching object. Listing
    /// failures are returned as errors.
    pub async fn locate(
        &self,
        bucket: &str,
        prefix: &str,
        job: &ExportJob,
    ) -> Result<Option<ResolvedArtifact>> {
        let prefix = directory_prefix(prefix);
        let objects = self.store.list_objects(bucket, &prefix).await?;

        let Some(latest) = select_latest(&objects, &prefix, &self.suffix) else {
            tracing::warn!(
                report_id = %job.report_id,
                bucket = %bucket,
                prefix = %prefix,
                listed = objects.len(),
                "No report file found under prefix"
            );
            return Ok(None);
        };

        let resolved_at = Utc::now();
        let artifact = ResolvedArtifact {
            report_kind: job.kind,
            report_id: job.report_id.clone(),
            bucket: bucket.to_string(),
            object_key: latest.key.clone(),
            file_name: attachment_file_name(job, &self.suffix, resolved_at),
            byte_size: latest.size,
            last_modified: latest.last_modified,
            resolved_at,
        };

        tracing::info!(
            report_id = %job.report_id,
            bucket = %bucket,
            key = %artifact.object_key,
            size_bytes = artifact.byte_size,
            candidates = objects.len(),
            "Report file located"
        );

        Ok(Some(artifact))
    }
}

/// `prefix` as a directory, so `a/b` never matches `a/b-old/`
fn directory_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

fn attachment_file_name(job: &ExportJob, suffix: &str, at: DateTime<Utc>) -> String {
    format!(
        "inspector-report-{}-{}{}",
        job.kind.slug(),
        at.format("%Y-%m-%d"),
        suffix
    )
}
