//! Bounded research runner.
//!
//! Submissions acquire a permit from a fixed-size semaphore before executing,
//! so at most `max_concurrent_jobs` pipelines run at once; the rest wait in
//! FIFO order on the semaphore. A supervisor task drains every job outcome so
//! no completion is silently dropped.

use crate::db::RecordStore;
use crate::pipeline::{CancelToken, ResearchSequencer};
use crate::types::{AppError, CompanyStatus, JobStatus, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

/// Terminal report for one submitted job, delivered to the supervisor.
#[derive(Debug)]
pub struct JobOutcome {
    pub job_id: Uuid,
    pub result: Result<()>,
}

pub struct ResearchRunner {
    sequencer: Arc<ResearchSequencer>,
    store: Arc<dyn RecordStore>,
    permits: Arc<Semaphore>,
    /// Cancel tokens for jobs that are queued or running.
    active: parking_lot::Mutex<HashMap<Uuid, CancelToken>>,
    outcomes: mpsc::UnboundedSender<JobOutcome>,
}

impl ResearchRunner {
    /// Build the runner and spawn its outcome supervisor.
    pub fn new(
        sequencer: Arc<ResearchSequencer>,
        store: Arc<dyn RecordStore>,
        max_concurrent_jobs: usize,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let runner = Arc::new(Self {
            sequencer,
            store,
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
            active: parking_lot::Mutex::new(HashMap::new()),
            outcomes: tx,
        });

        tokio::spawn(supervise(rx));

        runner
    }

    /// Number of jobs currently queued or running.
    pub fn active_jobs(&self) -> usize {
        self.active.lock().len()
    }

    /// Queue a job for execution. Returns immediately; the pipeline runs on
    /// its own task once a permit is available.
    pub fn submit(self: &Arc<Self>, job_id: Uuid) {
        let cancel = CancelToken::new();
        self.active.lock().insert(job_id, cancel.clone());

        let runner = Arc::clone(self);
        tokio::spawn(async move {
            let permit = match runner.permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    // Semaphore closed, only happens during shutdown.
                    runner.active.lock().remove(&job_id);
                    return;
                }
            };

            let result = if cancel.is_cancelled() {
                // Cancelled while waiting for a permit; the cancel path has
                // already persisted the terminal status.
                tracing::info!(job_id = %job_id, "Skipping cancelled job");
                Ok(())
            } else {
                runner.sequencer.execute_research(job_id, cancel).await
            };

            drop(permit);
            runner.active.lock().remove(&job_id);

            if runner.outcomes.send(JobOutcome { job_id, result }).is_err() {
                tracing::warn!(job_id = %job_id, "Outcome channel closed");
            }
        });
    }

    /// Cancel a queued or running job.
    ///
    /// Persists the terminal `Cancelled` status, reverts the company to
    /// `Pending` so it can be resubmitted, then fires the token. The running
    /// pipeline observes the token at its next stage boundary and stops
    /// without writing anything further.
    pub async fn cancel(&self, job_id: Uuid) -> Result<crate::types::ResearchJob> {
        let mut job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job not found: {}", job_id)))?;

        if !job.status.is_cancellable() {
            return Err(AppError::InvalidTransition(format!(
                "Cannot cancel job in status '{}'",
                job.status.as_str()
            )));
        }

        job.status = JobStatus::Cancelled;
        job.completed_at = Some(Utc::now());
        self.store.update_job(&job).await?;
        self.store
            .update_company_status(job.company_id, CompanyStatus::Pending)
            .await?;

        if let Some(token) = self.active.lock().remove(&job_id) {
            token.cancel();
        }

        tracing::info!(job_id = %job_id, "Research cancelled");

        Ok(job)
    }
}

/// Drain job outcomes for the life of the runner.
async fn supervise(mut rx: mpsc::UnboundedReceiver<JobOutcome>) {
    while let Some(outcome) = rx.recv().await {
        match outcome.result {
            Ok(()) => {
                tracing::debug!(job_id = %outcome.job_id, "Job finished");
            }
            Err(e) => {
                tracing::error!(job_id = %outcome.job_id, error = %e, "Job failed");
            }
        }
    }
}
