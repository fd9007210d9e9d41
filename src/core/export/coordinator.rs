//! Export coordinator - main orchestrator for the monthly export run
//!
//! A run builds its requests, submits them one at a time (waiting for each
//! to finish before the next, since the service allows a single report in
//! flight), then batch-waits on everything submitted. Each report that
//! succeeds is located in storage as soon as it finishes, and the resolved
//! artifacts are announced in one completion event.

use crate::adapters::{EventPublisher, FindingsReportService, ObjectStore};
use crate::config::{ExportConfig, VigilConfig};
use crate::core::export::poller::{ExportPoller, PollSettings, SuccessHandler};
use crate::core::export::requests::{build_requests, period, RunContext};
use crate::core::export::summary::ExportSummary;
use crate::core::locator::ArtifactLocator;
use crate::core::notifier::CompletionNotifier;
use crate::domain::{CompletionBundle, ExportJob, ReportKind, Result, VigilError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Export coordinator
pub struct ExportCoordinator {
    config: ExportConfig,
    ctx: RunContext,
    poller: ExportPoller,
    locator: ArtifactLocator,
    notifier: CompletionNotifier,
}

impl ExportCoordinator {
    /// Create a coordinator over the given service seams
    pub fn new(
        config: &VigilConfig,
        ctx: RunContext,
        reports: Arc<dyn FindingsReportService>,
        store: Arc<dyn ObjectStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            config: config.export.clone(),
            ctx,
            poller: ExportPoller::new(reports, PollSettings::from_config(&config.export)),
            locator: ArtifactLocator::new(store, config.export.report_suffix.clone()),
            notifier: CompletionNotifier::new(publisher, config.notification.clone()),
        }
    }

    /// Execute one export run for the period containing `now`
    ///
    /// # Errors
    ///
    /// Returns an error only when a submission fails for a reason other than
    /// another report being in progress. Failed, cancelled, timed out and
    /// unlocatable reports are recorded in the summary instead.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let requests = build_requests(&self.config, &self.ctx, now);
        let period = period(now);

        tracing::info!(
            period = %period,
            bucket = %self.config.bucket,
            requests = requests.len(),
            mode = ?self.config.mode,
            "Starting findings export"
        );

        let mut jobs: Vec<ExportJob> = Vec::with_capacity(requests.len());
        let mut conflicted: Vec<ReportKind> = Vec::new();

        for request in &requests {
            if let Some(previous) = jobs.last_mut() {
                if !previous.is_terminal() {
                    self.poller.wait_for_completion(previous).await;
                }
            }

            match self.poller.submit(request).await {
                Ok(job) => jobs.push(job),
                Err(VigilError::Export(ref e)) if e.is_conflict() => {
                    tracing::warn!(
                        report_kind = %request.kind,
                        error = %e,
                        "Another report is already in progress, request skipped"
                    );
                    conflicted.push(request.kind);
                }
                Err(e) => {
                    tracing::error!(report_kind = %request.kind, error = %e, "Report submission failed");
                    return Err(e);
                }
            }
        }

        let mut collector = BundleCollector {
            locator: &self.locator,
            bundle: CompletionBundle::new(
                self.config.bucket.clone(),
                self.ctx.account_id.clone(),
                self.ctx.environment.clone(),
                period.clone(),
            )
            .with_region(Some(self.ctx.region.clone())),
        };

        let jobs = self.poller.wait_for_all(jobs, &mut collector).await;
        let bundle = collector.bundle;

        let notified = if bundle.is_empty() {
            tracing::warn!(period = %period, "No report files resolved, completion event not sent");
            false
        } else {
            self.notifier.notify(&bundle).await
        };

        let summary = ExportSummary {
            period,
            requested: requests.len(),
            jobs,
            bundle,
            conflicted,
            notified,
            duration: start_time.elapsed(),
        };
        summary.log_summary();

        Ok(summary)
    }
}

/// Locates each succeeded job's report as soon as it finishes
struct BundleCollector<'a> {
    locator: &'a ArtifactLocator,
    bundle: CompletionBundle,
}

#[async_trait]
impl<'a> SuccessHandler for BundleCollector<'a> {
    async fn job_succeeded(&mut self, job: &ExportJob) {
        match self
            .locator
            .locate(&job.bucket, &job.destination_prefix, job)
            .await
        {
            Ok(Some(artifact)) => self.bundle.push(artifact),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(
                    report_id = %job.report_id,
                    bucket = %job.bucket,
                    prefix = %job.destination_prefix,
                    error = %e,
                    "Failed to locate report file, omitting from bundle"
                );
            }
        }
    }
}
