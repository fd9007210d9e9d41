//! Findings report service
//!
//! The scanning service is reached through two calls: create a CSV findings
//! report written to object storage, and query the status of a report by id.
//! [`FindingsReportService`] is the seam the export poller depends on;
//! [`InspectorReportService`] implements it with the Inspector2 SDK.

use crate::domain::report::{
    ExportRequest, FilterCriteria, StringComparison, StringFilter,
};
use crate::domain::{ExportError, JobStatus, ReportId, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_inspector2::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_inspector2::types as sdk;
use aws_sdk_inspector2::Client;

/// Status of a report as last reported by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportStatusSnapshot {
    pub status: JobStatus,
    /// Bucket the service wrote to
    pub bucket: Option<String>,
    /// Key prefix the service wrote under
    pub key_prefix: Option<String>,
    pub error_message: Option<String>,
}

impl ReportStatusSnapshot {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            bucket: None,
            key_prefix: None,
            error_message: None,
        }
    }
}

/// Scanning service operations used by the export poller
#[async_trait]
pub trait FindingsReportService: Send + Sync {
    /// Submit a report request
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Conflict`] when another report is already being
    /// generated, and [`ExportError::ExternalService`] for any other failure.
    async fn create_report(&self, request: &ExportRequest) -> Result<ReportId>;

    /// Query the current status of a report
    async fn report_status(&self, report_id: &ReportId) -> Result<ReportStatusSnapshot>;
}

/// Inspector2 implementation of [`FindingsReportService`]
#[derive(Clone)]
pub struct InspectorReportService {
    client: Client,
}

impl InspectorReportService {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FindingsReportService for InspectorReportService {
    async fn create_report(&self, request: &ExportRequest) -> Result<ReportId> {
        let destination = sdk::Destination::builder()
            .bucket_name(&request.destination.bucket)
            .key_prefix(&request.destination.key_prefix)
            .kms_key_arn(&request.destination.kms_key_arn)
            .build()
            .map_err(|e| ExportError::InvalidResponse(format!("Invalid destination: {e}")))?;

        let output = self
            .client
            .create_findings_report()
            .report_format(sdk::ReportFormat::Csv)
            .s3_destination(destination)
            .filter_criteria(to_sdk_filter(&request.filter)?)
            .send()
            .await
            .map_err(|e| {
                if is_in_progress_conflict(e.code(), e.message()) {
                    ExportError::Conflict(e.message().unwrap_or("report in progress").to_string())
                } else {
                    ExportError::ExternalService(format!(
                        "CreateFindingsReport failed: {}",
                        DisplayErrorContext(&e)
                    ))
                }
            })?;

        let report_id = output.report_id().ok_or_else(|| {
            ExportError::InvalidResponse("CreateFindingsReport returned no report id".to_string())
        })?;

        ReportId::new(report_id).map_err(|e| ExportError::InvalidResponse(e).into())
    }

    async fn report_status(&self, report_id: &ReportId) -> Result<ReportStatusSnapshot> {
        let output = self
            .client
            .get_findings_report_status()
            .report_id(report_id.as_str())
            .send()
            .await
            .map_err(|e| {
                ExportError::ExternalService(format!(
                    "GetFindingsReportStatus failed for {}: {}",
                    report_id,
                    DisplayErrorContext(&e)
                ))
            })?;

        let status = match output.status() {
            Some(sdk::ExternalReportStatus::Succeeded) => JobStatus::Succeeded,
            Some(sdk::ExternalReportStatus::Failed) => JobStatus::Failed,
            Some(sdk::ExternalReportStatus::Cancelled) => JobStatus::Cancelled,
            Some(sdk::ExternalReportStatus::InProgress) => JobStatus::InProgress,
            Some(other) => {
                tracing::warn!(report_id = %report_id, status = ?other, "Unrecognised report status");
                JobStatus::InProgress
            }
            None => JobStatus::Pending,
        };

        let destination = output.destination();
        Ok(ReportStatusSnapshot {
            status,
            bucket: destination.map(|d| d.bucket_name().to_string()),
            key_prefix: destination.and_then(|d| d.key_prefix()).map(str::to_string),
            error_message: output.error_message().map(str::to_string),
        })
    }
}

/// Whether a submission error means another report is still being generated
pub fn is_in_progress_conflict(code: Option<&str>, message: Option<&str>) -> bool {
    if matches!(code, Some("ConflictException")) {
        return true;
    }
    message
        .map(|m| m.to_lowercase().contains("in progress"))
        .unwrap_or(false)
}

fn to_sdk_filter(filter: &FilterCriteria) -> Result<sdk::FilterCriteria> {
    Ok(sdk::FilterCriteria::builder()
        .set_finding_status(to_sdk_strings(&filter.finding_status)?)
        .set_resource_type(to_sdk_strings(&filter.resource_type)?)
        .set_ec2_instance_vpc_id(to_sdk_strings(&filter.ec2_instance_vpc_id)?)
        .build())
}

fn to_sdk_strings(filters: &[StringFilter]) -> Result<Option<Vec<sdk::StringFilter>>> {
    if filters.is_empty() {
        return Ok(None);
    }

    filters
        .iter()
        .map(|f| {
            let comparison = match f.comparison {
                StringComparison::Equals => sdk::StringComparison::Equals,
                StringComparison::NotEquals => sdk::StringComparison::NotEquals,
                StringComparison::Prefix => sdk::StringComparison::Prefix,
            };
            sdk::StringFilter::builder()
                .comparison(comparison)
                .value(&f.value)
                .build()
                .map_err(|e| ExportError::InvalidResponse(format!("Invalid filter: {e}")).into())
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}
