//! Findings export orchestration
//!
//! This module provides the export side of Vigil:
//! - Building the month's report requests
//! - Submitting and polling reports
//! - Coordinating a run and summarising it

pub mod coordinator;
pub mod poller;
pub mod requests;
pub mod summary;

pub use coordinator::ExportCoordinator;
pub use poller::{ExportPoller, PollSettings, SuccessHandler};
pub use requests::{build_requests, period, period_prefix, RunContext};
pub use summary::ExportSummary;
