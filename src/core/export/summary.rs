//! Export run summary
//!
//! This module defines the record of one export run and how it is reported.

use crate::core::response::InvocationResponse;
use crate::domain::{CompletionBundle, ExportJob, ReportKind};
use serde_json::json;
use std::time::Duration;

/// Outcome of one export run
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Reporting period, `YYYY-MM`
    pub period: String,

    /// Number of requests built for the run
    pub requested: usize,

    /// Every submitted job with its final status
    pub jobs: Vec<ExportJob>,

    /// Artifacts resolved from succeeded jobs
    pub bundle: CompletionBundle,

    /// Requests rejected because another report was in progress
    pub conflicted: Vec<ReportKind>,

    /// Whether the completion event was accepted
    pub notified: bool,

    /// Duration of the run
    pub duration: Duration,
}

impl ExportSummary {
    /// Every requested report was generated and located
    pub fn is_complete(&self) -> bool {
        self.requested > 0 && self.bundle.len() == self.requested
    }

    /// Jobs that did not produce an artifact
    pub fn incomplete_jobs(&self) -> impl Iterator<Item = &ExportJob> {
        self.jobs.iter().filter(move |job| {
            !self
                .bundle
                .artifacts
                .iter()
                .any(|a| a.report_id == job.report_id)
        })
    }

    /// Process exit code: 0 when complete, 1 for a partial run
    pub fn exit_code(&self) -> i32 {
        if self.is_complete() {
            0
        } else {
            1
        }
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            period = %self.period,
            requested = self.requested,
            submitted = self.jobs.len(),
            resolved = self.bundle.len(),
            notified = self.notified,
            duration_secs = self.duration.as_secs(),
            "Export run completed"
        );

        for kind in &self.conflicted {
            tracing::warn!(
                report_kind = %kind,
                "Report not requested: another report was already in progress"
            );
        }

        for job in self.incomplete_jobs() {
            tracing::warn!(
                report_id = %job.report_id,
                report_kind = %job.kind,
                status = %job.status,
                "Report missing from bundle"
            );
        }
    }

    /// Response body returned to the invoker
    pub fn to_response(&self) -> InvocationResponse {
        let report_ids: Vec<&str> = self.jobs.iter().map(|j| j.report_id.as_str()).collect();
        let artifacts: Vec<&str> = self
            .bundle
            .artifacts
            .iter()
            .map(|a| a.object_key.as_str())
            .collect();
        let incomplete: Vec<_> = self
            .incomplete_jobs()
            .map(|j| json!({ "report_id": j.report_id, "report_kind": j.kind, "status": j.status }))
            .collect();

        let message = if self.is_complete() {
            "Inspector reports generated"
        } else if self.bundle.is_empty() {
            "No Inspector reports were generated"
        } else {
            "Inspector reports partially generated"
        };

        InvocationResponse::ok(json!({
            "message": message,
            "run_id": self.bundle.run_id,
            "period": self.period,
            "report_ids": report_ids,
            "artifacts": artifacts,
            "incomplete": incomplete,
            "conflicted": self.conflicted,
            "notified": self.notified,
        }))
    }
}
