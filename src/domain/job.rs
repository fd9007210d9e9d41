//! Export job state machine
//!
//! An [`ExportJob`] tracks one submitted report request. Its status only moves
//! forward: `Pending -> InProgress -> {Succeeded, Failed, Cancelled, TimedOut}`.
//! Once terminal, further observations are ignored.

use crate::domain::ids::ReportId;
use crate::domain::report::{ExportRequest, ReportKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Submitted, not yet observed by a poll
    Pending,
    /// The service is generating the report
    InProgress,
    /// The report was written to storage
    Succeeded,
    /// The service gave up on the report
    Failed,
    /// The report was cancelled
    Cancelled,
    /// We stopped waiting for it
    TimedOut,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl JobStatus {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled | JobStatus::TimedOut
        )
    }

    /// Next status given what the service just reported
    ///
    /// Terminal states absorb every observation. A non-terminal job never
    /// moves back to `Pending`.
    pub fn advance(self, observed: JobStatus) -> JobStatus {
        if self.is_terminal() {
            return self;
        }
        match observed {
            JobStatus::Pending => self,
            other => other,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "PENDING",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::TimedOut => "TIMED_OUT",
        };
        f.write_str(s)
    }
}

/// One submitted findings report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    /// Handle returned by the service
    pub report_id: ReportId,

    /// Slice of findings this job covers
    pub kind: ReportKind,

    /// Current status
    pub status: JobStatus,

    /// Bucket the report is written to
    pub bucket: String,

    /// Key prefix the report is written under
    pub destination_prefix: String,

    /// When the request was accepted
    pub submitted_at: DateTime<Utc>,

    /// When the job reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,

    /// Error text reported by the service, if any
    pub error_message: Option<String>,
}

impl ExportJob {
    /// Create a job for a freshly accepted request
    pub fn submitted(report_id: ReportId, request: &ExportRequest) -> Self {
        Self {
            report_id,
            kind: request.kind,
            status: JobStatus::Pending,
            bucket: request.destination.bucket.clone(),
            destination_prefix: request.destination.key_prefix.clone(),
            submitted_at: Utc::now(),
            finished_at: None,
            error_message: None,
        }
    }

    /// Apply a polled status
    ///
    /// Returns `true` when this observation moved the job into a terminal state.
    pub fn observe(&mut self, observed: JobStatus, error_message: Option<String>) -> bool {
        let was_terminal = self.status.is_terminal();
        self.status = self.status.advance(observed);

        if !was_terminal && self.status.is_terminal() {
            self.finished_at = Some(Utc::now());
            if error_message.is_some() {
                self.error_message = error_message;
            }
            return true;
        }
        false
    }

    /// Give up on the job after the polling ceiling elapsed
    pub fn mark_timed_out(&mut self) {
        if !self.status.is_terminal() {
            self.status = JobStatus::TimedOut;
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == JobStatus::Succeeded
    }
}
