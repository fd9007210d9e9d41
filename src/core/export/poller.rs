//! Export poller
//!
//! The scanning service offers no callback, so progress is observed by
//! polling. Two strategies are provided:
//!
//! - [`ExportPoller::wait_for_completion`] blocks on a single job. It is used
//!   between submissions because the service accepts only one report in
//!   flight.
//! - [`ExportPoller::wait_for_all`] polls every pending job once per round and
//!   hands each newly succeeded job to a [`SuccessHandler`] right away.
//!
//! Both loops stop at the configured ceiling. Jobs still pending at that point
//! are marked `TIMED_OUT` and left out of the run's output; the run itself
//! carries on. A failed status call only costs the job its turn in the round.

use crate::adapters::FindingsReportService;
use crate::config::ExportConfig;
use crate::domain::{ExportJob, ExportRequest, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Polling cadence and ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub ceiling: Duration,
}

impl PollSettings {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_secs),
            ceiling: Duration::from_secs(config.poll_ceiling_secs),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

/// Receives jobs the moment they succeed during a batch wait
#[async_trait]
pub trait SuccessHandler: Send {
    async fn job_succeeded(&mut self, job: &ExportJob);
}

/// Submits report requests and tracks them to a terminal state
pub struct ExportPoller {
    service: Arc<dyn FindingsReportService>,
    settings: PollSettings,
}

impl ExportPoller {
    pub fn new(service: Arc<dyn FindingsReportService>, settings: PollSettings) -> Self {
        Self { service, settings }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Submit one request
    ///
    /// # Errors
    ///
    /// Propagates the service error unchanged, so callers can recognise the
    /// "report already in progress" conflict.
    pub async fn submit(&self, request: &ExportRequest) -> Result<ExportJob> {
        let report_id = self.service.create_report(request).await?;
        let job = ExportJob::submitted(report_id, request);

        tracing::info!(
            report_id = %job.report_id,
            report_kind = %job.kind,
            bucket = %job.bucket,
            prefix = %job.destination_prefix,
            "Findings report submitted"
        );

        Ok(job)
    }

    /// Query the job's status once and apply it
    ///
    /// Returns `true` when this call moved the job into a terminal state.
    pub async fn poll(&self, job: &mut ExportJob) -> Result<bool> {
        let snapshot = self.service.report_status(&job.report_id).await?;
        let previous = job.status;
        let finished = job.observe(snapshot.status, snapshot.error_message);

        if finished && job.is_succeeded() {
            if let Some(prefix) = snapshot.key_prefix.filter(|p| !p.is_empty()) {
                job.destination_prefix = prefix;
            }
            if let Some(bucket) = snapshot.bucket.filter(|b| !b.is_empty()) {
                job.bucket = bucket;
            }
        }

        if job.status != previous {
            crate::log_report_transition!(job.report_id, job.kind, previous, job.status);
        }

        Ok(finished)
    }

    /// Wait for a single job to finish (single-wait)
    ///
    /// Never fails: poll errors are logged and retried on the next tick, and
    /// reaching the ceiling marks the job `TIMED_OUT`.
    pub async fn wait_for_completion(&self, job: &mut ExportJob) {
        let started = Instant::now();

        while !job.is_terminal() {
            if let Err(e) = self.poll(job).await {
                tracing::warn!(
                    report_id = %job.report_id,
                    error = %e,
                    "Status query failed, will retry"
                );
            }

            if job.is_terminal() {
                break;
            }

            if started.elapsed() >= self.settings.ceiling {
                job.mark_timed_out();
                tracing::warn!(
                    report_id = %job.report_id,
                    report_kind = %job.kind,
                    waited_secs = started.elapsed().as_secs(),
                    "Gave up waiting for report"
                );
                break;
            }

            tokio::time::sleep(self.settings.interval).await;
        }

        log_finished(job);
    }

    /// Wait for every job to finish (batch-wait)
    ///
    /// Returns all jobs, in the order given, with their final status. Jobs
    /// that were already succeeded on entry are handed to `handler` first.
    pub async fn wait_for_all(
        &self,
        jobs: Vec<ExportJob>,
        handler: &mut dyn SuccessHandler,
    ) -> Vec<ExportJob> {
        let started = Instant::now();
        let mut finished: Vec<(usize, ExportJob)> = Vec::with_capacity(jobs.len());
        let mut pending: Vec<(usize, ExportJob)> = Vec::new();

        for (index, job) in jobs.into_iter().enumerate() {
            if job.is_terminal() {
                if job.is_succeeded() {
                    handler.job_succeeded(&job).await;
                }
                finished.push((index, job));
            } else {
                pending.push((index, job));
            }
        }

        tracing::info!(
            pending = pending.len(),
            finished = finished.len(),
            "Waiting for findings reports"
        );

        let mut round = 0u32;
        while !pending.is_empty() {
            round += 1;
            let mut still_pending = Vec::with_capacity(pending.len());

            for (index, mut job) in pending {
                match self.poll(&mut job).await {
                    Ok(true) => {
                        log_finished(&job);
                        if job.is_succeeded() {
                            handler.job_succeeded(&job).await;
                        }
                        finished.push((index, job));
                    }
                    Ok(false) => still_pending.push((index, job)),
                    Err(e) => {
                        tracing::warn!(
                            report_id = %job.report_id,
                            round = round,
                            error = %e,
                            "Status query failed, job stays pending"
                        );
                        still_pending.push((index, job));
                    }
                }
            }

            pending = still_pending;
            if pending.is_empty() {
                break;
            }

            if started.elapsed() >= self.settings.ceiling {
                for (index, mut job) in pending {
                    job.mark_timed_out();
                    tracing::warn!(
                        report_id = %job.report_id,
                        report_kind = %job.kind,
                        "Report incomplete at polling ceiling, excluded from run"
                    );
                    finished.push((index, job));
                }
                break;
            }

            tokio::time::sleep(self.settings.interval).await;
        }

        finished.sort_by_key(|(index, _)| *index);
        finished.into_iter().map(|(_, job)| job).collect()
    }
}

fn log_finished(job: &ExportJob) {
    if job.is_succeeded() {
        tracing::info!(
            report_id = %job.report_id,
            report_kind = %job.kind,
            prefix = %job.destination_prefix,
            "Findings report completed"
        );
    } else {
        tracing::warn!(
            report_id = %job.report_id,
            report_kind = %job.kind,
            status = %job.status,
            error_message = ?job.error_message,
            "Findings report did not complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ReportStatusSnapshot;
    use crate::domain::report::{FilterCriteria, ReportDestination, ReportKind};
    use crate::domain::{ExportError, JobStatus, ReportId, VigilError};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Replays scripted statuses per report id; the last entry repeats
    #[derive(Default)]
    struct ScriptedService {
        scripts: Mutex<HashMap<String, VecDeque<Result<JobStatus>>>>,
        polls: Mutex<u32>,
    }

    impl ScriptedService {
        fn script(self, id: &str, statuses: Vec<Result<JobStatus>>) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .insert(id.to_string(), statuses.into());
            self
        }
    }

    #[async_trait]
    impl FindingsReportService for ScriptedService {
        async fn create_report(&self, _request: &ExportRequest) -> Result<ReportId> {
            Ok(ReportId::new("r-new").unwrap())
        }

        async fn report_status(&self, report_id: &ReportId) -> Result<ReportStatusSnapshot> {
            *self.polls.lock().unwrap() += 1;
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts.get_mut(report_id.as_str()).unwrap();
            let next = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                match script.front().unwrap() {
                    Ok(status) => Ok(*status),
                    Err(_) => Err(VigilError::Other("still failing".to_string())),
                }
            };
            next.map(ReportStatusSnapshot::new)
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<String>);

    #[async_trait]
    impl SuccessHandler for Recorder {
        async fn job_succeeded(&mut self, job: &ExportJob) {
            self.0.push(job.report_id.to_string());
        }
    }

    fn request() -> ExportRequest {
        ExportRequest {
            kind: ReportKind::EverythingElse,
            filter: FilterCriteria::default(),
            destination: ReportDestination {
                bucket: "bucket".to_string(),
                key_prefix: "inspector-reports/2024-05/non-ec2-resources".to_string(),
                kms_key_arn: "arn".to_string(),
            },
        }
    }

    fn job(id: &str) -> ExportJob {
        ExportJob::submitted(ReportId::new(id).unwrap(), &request())
    }

    fn settings() -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(30),
            ceiling: Duration::from_secs(1800),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_wait_until_succeeded() {
        let service = ScriptedService::default().script(
            "r-1",
            vec![
                Ok(JobStatus::InProgress),
                Err(VigilError::Other("throttled".to_string())),
                Ok(JobStatus::Succeeded),
            ],
        );
        let poller = ExportPoller::new(Arc::new(service), settings());

        let mut job = job("r-1");
        poller.wait_for_completion(&mut job).await;
        assert_eq!(job.status, JobStatus::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_wait_times_out_at_ceiling() {
        let service = Arc::new(
            ScriptedService::default().script("r-1", vec![Ok(JobStatus::InProgress)]),
        );
        let poller = ExportPoller::new(service.clone(), settings());

        let started = Instant::now();
        let mut job = job("r-1");
        poller.wait_for_completion(&mut job).await;

        assert_eq!(job.status, JobStatus::TimedOut);
        assert!(started.elapsed() >= Duration::from_secs(1800));
        assert!(started.elapsed() < Duration::from_secs(1800 + 30));
        assert_eq!(*service.polls.lock().unwrap(), 61);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_wait_reports_successes_immediately() {
        let service = ScriptedService::default()
            .script("a", vec![Ok(JobStatus::InProgress), Ok(JobStatus::Succeeded)])
            .script("b", vec![Ok(JobStatus::Succeeded)])
            .script("c", vec![Ok(JobStatus::InProgress), Ok(JobStatus::Failed)]);
        let poller = ExportPoller::new(Arc::new(service), settings());

        let mut recorder = Recorder::default();
        let jobs = poller
            .wait_for_all(vec![job("a"), job("b"), job("c")], &mut recorder)
            .await;

        assert_eq!(recorder.0, vec!["b", "a"]);
        let statuses: Vec<_> = jobs.iter().map(|j| j.status).collect();
        assert_eq!(
            statuses,
            vec![JobStatus::Succeeded, JobStatus::Succeeded, JobStatus::Failed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_wait_poll_errors_keep_job_pending() {
        let service = ScriptedService::default().script(
            "a",
            vec![
                Err(VigilError::Export(ExportError::ExternalService("503".to_string()))),
                Err(VigilError::Export(ExportError::ExternalService("503".to_string()))),
                Ok(JobStatus::Succeeded),
            ],
        );
        let poller = ExportPoller::new(Arc::new(service), settings());

        let mut recorder = Recorder::default();
        let jobs = poller.wait_for_all(vec![job("a")], &mut recorder).await;

        assert_eq!(jobs[0].status, JobStatus::Succeeded);
        assert_eq!(recorder.0, vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_wait_abandons_pending_at_ceiling() {
        let service = ScriptedService::default()
            .script("fast", vec![Ok(JobStatus::Succeeded)])
            .script("slow", vec![Ok(JobStatus::InProgress)]);
        let poller = ExportPoller::new(Arc::new(service), settings());

        let mut recorder = Recorder::default();
        let jobs = poller
            .wait_for_all(vec![job("slow"), job("fast")], &mut recorder)
            .await;

        assert_eq!(recorder.0, vec!["fast"]);
        assert_eq!(jobs[0].status, JobStatus::TimedOut);
        assert_eq!(jobs[1].status, JobStatus::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_wait_hands_over_already_succeeded_jobs() {
        let service = ScriptedService::default();
        let poller = ExportPoller::new(Arc::new(service), settings());

        let mut done = job("done");
        done.observe(JobStatus::Succeeded, None);

        let mut recorder = Recorder::default();
        let jobs = poller.wait_for_all(vec![done], &mut recorder).await;

        assert_eq!(recorder.0, vec!["done"]);
        assert_eq!(jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_returns_pending_job() {
        let poller = ExportPoller::new(Arc::new(ScriptedService::default()), settings());
        let submitted = poller.submit(&request()).await.unwrap();
        assert_eq!(submitted.report_id.as_str(), "r-new");
        assert_eq!(submitted.status, JobStatus::Pending);
    }
}
