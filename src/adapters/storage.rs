//! Object storage access
//!
//! [`ObjectStore`] covers the four storage operations Vigil needs: prefix
//! listing for the artifact locator, and size lookup, full download and
//! streaming reads for the attachment pipeline. [`S3ObjectStore`] is the
//! production implementation.

use crate::domain::{Result, StorageError};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Streaming object body
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// One listed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Object storage operations
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object under a prefix, following pagination
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>>;

    /// Size of an object from a metadata-only request
    async fn object_size(&self, bucket: &str, key: &str) -> Result<u64>;

    /// Download an object fully into memory
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Open an object for streaming reads
    async fn open_object(&self, bucket: &str, key: &str) -> Result<ObjectReader>;
}

/// S3 implementation of [`ObjectStore`]
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build a client from the shared SDK configuration
    ///
    /// When a custom endpoint is in use, path-style addressing is forced so
    /// S3-compatible stacks resolve bucket names.
    pub fn new(config: &SdkConfig, path_style: bool) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(config)
            .force_path_style(path_style)
            .build();

        Self {
            client: Client::from_conf(s3_config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let start = std::time::Instant::now();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %bucket,
                    prefix = %prefix,
                    "S3 list failed"
                );
                StorageError::ListFailed(format!("{bucket}/{prefix}: {}", DisplayErrorContext(&e)))
            })?;

            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                objects.push(ObjectSummary {
                    key: key.to_string(),
                    size: object.size().unwrap_or_default().max(0) as u64,
                    last_modified: object.last_modified().and_then(|t| {
                        DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())
                    }),
                });
            }
        }

        tracing::debug!(
            bucket = %bucket,
            prefix = %prefix,
            object_count = objects.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list completed"
        );

        Ok(objects)
    }

    async fn object_size(&self, bucket: &str, key: &str) -> Result<u64> {
        let response = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(service_err)
                    if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
                {
                    StorageError::NotFound(format!("{bucket}/{key}"))
                }
                _ => StorageError::HeadFailed(format!(
                    "{bucket}/{key}: {}",
                    DisplayErrorContext(&e)
                )),
            })?;

        let size = response.content_length().ok_or_else(|| {
            StorageError::HeadFailed(format!("{bucket}/{key}: no content length"))
        })?;

        Ok(size.max(0) as u64)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let start = std::time::Instant::now();
        let response = self.send_get(bucket, key).await?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("{bucket}/{key}: {e}")))?;

        let bytes = data.into_bytes().to_vec();

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes)
    }

    async fn open_object(&self, bucket: &str, key: &str) -> Result<ObjectReader> {
        let response = self.send_get(bucket, key).await?;
        Ok(Box::pin(response.body.into_async_read()))
    }
}

impl S3ObjectStore {
    async fn send_get(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<aws_sdk_s3::operation::get_object::GetObjectOutput> {
        self.client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let err = match &e {
                    SdkError::ServiceError(service_err)
                        if matches!(service_err.err(), GetObjectError::NoSuchKey(_)) =>
                    {
                        StorageError::NotFound(format!("{bucket}/{key}"))
                    }
                    _ => StorageError::DownloadFailed(format!(
                        "{bucket}/{key}: {}",
                        DisplayErrorContext(&e)
                    )),
                };
                tracing::error!(error = %err, bucket = %bucket, key = %key, "S3 download failed");
                err.into()
            })
    }
}
