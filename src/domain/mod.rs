//! Domain models and types for Vigil.
//!
//! This module contains the core domain models, types, and business rules.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ReportId`], [`EmailAddress`])
//! - **Report requests** ([`ExportRequest`], [`ReportKind`], [`FilterCriteria`])
//! - **Job state machine** ([`ExportJob`], [`JobStatus`])
//! - **Artifacts** ([`ResolvedArtifact`], [`CompletionBundle`])
//! - **Mail model** ([`Attachment`], [`OutboundMessage`], [`DeliveryOutcome`])
//! - **Error types** ([`VigilError`], [`ExportError`], [`StorageError`], [`MailError`])
//! - **Result type alias** ([`Result`])
//!
//! # Job lifecycle
//!
//! ```rust
//! use vigil::domain::JobStatus;
//!
//! let status = JobStatus::Pending.advance(JobStatus::InProgress);
//! assert_eq!(status, JobStatus::InProgress);
//!
//! let status = status.advance(JobStatus::Succeeded);
//! assert!(status.is_terminal());
//!
//! // Terminal states are never reopened
//! assert_eq!(status.advance(JobStatus::InProgress), JobStatus::Succeeded);
//! ```

pub mod artifact;
pub mod errors;
pub mod ids;
pub mod job;
pub mod mail;
pub mod report;
pub mod result;
pub mod trigger;

// Re-export commonly used types for convenience
pub use artifact::{CompletionBundle, ResolvedArtifact};
pub use errors::{ExportError, MailError, StorageError, VigilError};
pub use ids::{EmailAddress, ReportId};
pub use job::{ExportJob, JobStatus};
pub use mail::{
    Attachment, DeliveryOutcome, DeliveryStatus, OutboundMessage, Recipient, RecipientKind,
};
pub use report::{ExportRequest, FilterCriteria, ReportDestination, ReportKind, StringFilter};
pub use result::Result;
pub use trigger::{ArtifactDescriptor, MailerTrigger, RecipientList};
