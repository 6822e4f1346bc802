//! In-process delayed-action scheduler backed by tokio timers.
//!
//! Each pending job owns a spawned task that sleeps until the job's run
//! time. The pending table maps a [`JobId`] to the generation of the task
//! currently allowed to fire; a task that wakes up and no longer owns its
//! slot exits without running. Jobs live in memory only and are lost on
//! restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use daylight_domain::error::{DaylightError, SchedulingError};
use daylight_domain::job::{JobId, ScheduledJob};
use daylight_domain::time::{Timestamp, now};

use crate::ports::{JobRunner, ScheduleOutcome, Scheduler};

struct PendingJob {
    generation: u64,
    run_at: Timestamp,
    handle: JoinHandle<()>,
}

struct Inner<R> {
    runner: R,
    pending: Mutex<HashMap<JobId, PendingJob>>,
    generations: AtomicU64,
    shut_down: Mutex<bool>,
}

impl<R> Inner<R> {
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<JobId, PendingJob>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_shut_down(&self) -> bool {
        *self.shut_down.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove the slot for `id` if `generation` still owns it.
    fn claim(&self, id: &JobId, generation: u64) -> bool {
        let mut pending = self.lock_pending();
        match pending.get(id) {
            Some(entry) if entry.generation == generation => {
                pending.remove(id);
                true
            }
            _ => false,
        }
    }
}

impl<R: JobRunner> Inner<R> {
    async fn fire(&self, job: ScheduledJob, generation: u64) {
        if !self.claim(&job.id, generation) {
            tracing::debug!(job_id = %job.id, "job superseded before firing");
            return;
        }

        let job_id = job.id.clone();
        tracing::info!(%job_id, device_id = %job.device.id, target = %job.target, "running scheduled job");
        match self.runner.run(job).await {
            Ok(()) => tracing::info!(%job_id, "scheduled job completed"),
            Err(err) => tracing::error!(%job_id, error = %err, "scheduled job failed"),
        }
    }
}

/// Scheduler running due jobs on tokio tasks, with replace-on-conflict
/// semantics per [`JobId`].
///
/// Cloning yields another handle to the same pending table.
pub struct InProcessScheduler<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for InProcessScheduler<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> InProcessScheduler<R>
where
    R: JobRunner + Send + Sync + 'static,
{
    /// Create a scheduler that hands due jobs to `runner`.
    pub fn new(runner: R) -> Self {
        Self {
            inner: Arc::new(Inner {
                runner,
                pending: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
                shut_down: Mutex::new(false),
            }),
        }
    }

    /// Submit `job`, replacing any pending job with the same id.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::ShutDown`] once [`shutdown`](Self::shutdown)
    /// has been called.
    pub fn submit(&self, job: ScheduledJob) -> Result<ScheduleOutcome, SchedulingError> {
        let mut pending = self.inner.lock_pending();
        if self.inner.is_shut_down() {
            return Err(SchedulingError::ShutDown);
        }

        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed);
        let delay = (job.run_at - now()).to_std().unwrap_or(Duration::ZERO);
        let id = job.id.clone();
        let run_at = job.run_at;

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.fire(job, generation).await;
        });

        let outcome = match pending.insert(
            id.clone(),
            PendingJob {
                generation,
                run_at,
                handle,
            },
        ) {
            Some(previous) => {
                previous.handle.abort();
                ScheduleOutcome::Replaced
            }
            None => ScheduleOutcome::Created,
        };

        tracing::info!(job_id = %id, %run_at, delay_secs = delay.as_secs(), ?outcome, "job scheduled");
        Ok(outcome)
    }

    /// Pending job ids with their run times, soonest first.
    #[must_use]
    pub fn pending(&self) -> Vec<(JobId, Timestamp)> {
        let mut jobs: Vec<_> = self
            .inner
            .lock_pending()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.run_at))
            .collect();
        jobs.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        jobs
    }

    /// Stop accepting jobs and drop every pending one.
    ///
    /// Returns the number of jobs that were still pending. Jobs already
    /// running are left to finish.
    pub fn shutdown(&self) -> usize {
        let mut pending = self.inner.lock_pending();
        *self
            .inner
            .shut_down
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = true;

        let dropped = pending.len();
        for (id, entry) in pending.drain() {
            entry.handle.abort();
            tracing::warn!(job_id = %id, run_at = %entry.run_at, "pending job dropped on shutdown");
        }
        dropped
    }
}

impl<R> Scheduler for InProcessScheduler<R>
where
    R: JobRunner + Send + Sync + 'static,
{
    fn schedule(
        &self,
        job: ScheduledJob,
    ) -> impl std::future::Future<Output = Result<ScheduleOutcome, DaylightError>> + Send {
        let result = self.submit(job).map_err(DaylightError::from);
        async move { result }
    }
}
