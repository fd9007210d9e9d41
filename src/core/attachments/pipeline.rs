//! Attachment pipeline
//!
//! Turns the artifact descriptors of a mailer trigger into attachments, one
//! artifact at a time. Reports up to the compression threshold are streamed
//! through the chunked encoder; larger ones are downloaded, zipped and
//! encoded. Buffers are released before the next artifact starts.
//!
//! The pipeline is all-or-nothing: a failing artifact does not stop the loop,
//! but any failure turns the outcome into [`PipelineOutcome::Failed`] and the
//! prepared attachments are discarded.

use super::encode::{compress_and_encode, encode_chunked, Base64ChunkSize};
use crate::adapters::ObjectStore;
use crate::config::MailConfig;
use crate::domain::mail::{CSV_MEDIA_TYPE, ZIP_MEDIA_TYPE, ZIP_SUFFIX};
use crate::domain::{ArtifactDescriptor, Attachment, Result, VigilError};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;

/// Sizing rules for attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentSettings {
    /// Reports strictly larger than this are compressed
    pub compression_threshold: u64,
    pub chunk_size: Base64ChunkSize,
}

impl AttachmentSettings {
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        Ok(Self {
            compression_threshold: config.compression_threshold_bytes,
            chunk_size: Base64ChunkSize::new(config.chunk_size_bytes)
                .map_err(VigilError::Configuration)?,
        })
    }
}

/// One artifact that could not be attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFailure {
    /// `bucket/key`, or a placeholder when the reference was missing
    pub reference: String,
    pub reason: String,
}

/// Result of preparing every attachment of a trigger
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Every artifact became an attachment, in trigger order
    Ready(Vec<Attachment>),
    /// At least one artifact failed; nothing may be sent
    Failed {
        prepared: usize,
        failures: Vec<ArtifactFailure>,
    },
}

impl PipelineOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, PipelineOutcome::Ready(_))
    }
}

pub struct AttachmentPipeline {
    store: Arc<dyn ObjectStore>,
    settings: AttachmentSettings,
}

impl AttachmentPipeline {
    pub fn new(store: Arc<dyn ObjectStore>, settings: AttachmentSettings) -> Self {
        Self { store, settings }
    }

    /// Prepare attachments for every descriptor
    ///
    /// `default_bucket` fills in descriptors that carry no bucket of their
    /// own. `report_date` names attachments whose descriptor has no file name.
    pub async fn build(
        &self,
        descriptors: &[ArtifactDescriptor],
        default_bucket: Option<&str>,
        report_date: NaiveDate,
    ) -> PipelineOutcome {
        let mut attachments = Vec::with_capacity(descriptors.len());
        let mut failures = Vec::new();

        for (index, descriptor) in descriptors.iter().enumerate() {
            match self.prepare(descriptor, default_bucket, report_date).await {
                Ok(attachment) => attachments.push(attachment),
                Err(e) => {
                    let reference = reference(descriptor, default_bucket)
                        .unwrap_or_else(|| format!("artifact #{}", index + 1));
                    tracing::error!(reference = %reference, error = %e, "Failed to prepare attachment");
                    failures.push(ArtifactFailure {
                        reference,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            PipelineOutcome::Ready(attachments)
        } else {
            PipelineOutcome::Failed {
                prepared: attachments.len(),
                failures,
            }
        }
    }

    async fn prepare(
        &self,
        descriptor: &ArtifactDescriptor,
        default_bucket: Option<&str>,
        report_date: NaiveDate,
    ) -> Result<Attachment> {
        let bucket = descriptor
            .bucket
            .as_deref()
            .or(default_bucket)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| VigilError::Validation("artifact has no bucket".to_string()))?;
        let key = descriptor
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| VigilError::Validation("artifact has no object key".to_string()))?;

        let size = match descriptor.byte_size {
            Some(size) => size,
            None => self.store.object_size(bucket, key).await?,
        };

        let file_name = file_name(descriptor, report_date);
        let start = Instant::now();

        let attachment = if size > self.settings.compression_threshold {
            let data = self.store.get_object(bucket, key).await?;
            let content = compress_and_encode(&file_name, &data)?;
            drop(data);
            Attachment {
                media_type: ZIP_MEDIA_TYPE.to_string(),
                name: format!("{file_name}{ZIP_SUFFIX}"),
                content,
                compressed: true,
            }
        } else {
            let mut reader = self.store.open_object(bucket, key).await?;
            let content = encode_chunked(&mut reader, self.settings.chunk_size).await?;
            Attachment {
                media_type: CSV_MEDIA_TYPE.to_string(),
                name: file_name,
                content,
                compressed: false,
            }
        };

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            encoded_bytes = attachment.content.len(),
            compressed = attachment.compressed,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Attachment prepared"
        );

        Ok(attachment)
    }
}

fn reference(descriptor: &ArtifactDescriptor, default_bucket: Option<&str>) -> Option<String> {
    let key = descriptor.key.as_deref()?;
    let bucket = descriptor.bucket.as_deref().or(default_bucket).unwrap_or("?");
    Some(format!("{bucket}/{key}"))
}

/// Encoded bytes the attachments add to a message
pub fn encoded_size(attachments: &[Attachment]) -> u64 {
    attachments.iter().map(|a| a.content.len() as u64).sum()
}

/// Attachment name for a descriptor
///
/// Uses the descriptor's own name when given, otherwise
/// `inspector-report[-<kind>]-<YYYY-MM-DD>.csv`.
pub fn file_name(descriptor: &ArtifactDescriptor, report_date: NaiveDate) -> String {
    if let Some(name) = descriptor.file_name.as_deref().filter(|n| !n.trim().is_empty()) {
        return name.to_string();
    }

    let date = report_date.format("%Y-%m-%d");
    match descriptor.report_kind {
        Some(kind) => format!("inspector-report-{}-{}.csv", kind.slug(), date),
        None => format!("inspector-report-{}.csv", date),
    }
}
