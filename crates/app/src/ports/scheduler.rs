//! Scheduler ports: deferred execution of actuation jobs.

use std::future::Future;
use std::sync::Arc;

use daylight_domain::error::DaylightError;
use daylight_domain::job::ScheduledJob;

/// Whether a submitted job was new or superseded a pending one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Created,
    Replaced,
}

/// Accepts jobs and runs them at (or after) their run time.
///
/// Submitting a job whose id is already pending replaces the pending job
/// atomically: the earlier one never runs.
pub trait Scheduler {
    /// Submit `job` for deferred execution.
    fn schedule(
        &self,
        job: ScheduledJob,
    ) -> impl Future<Output = Result<ScheduleOutcome, DaylightError>> + Send;
}

/// Executes a due job on the scheduler's own execution context.
pub trait JobRunner {
    /// Run `job`. Errors are reported back to the scheduler, which logs them.
    fn run(&self, job: ScheduledJob) -> impl Future<Output = Result<(), DaylightError>> + Send;
}

impl<T: Scheduler + Send + Sync> Scheduler for Arc<T> {
    fn schedule(
        &self,
        job: ScheduledJob,
    ) -> impl Future<Output = Result<ScheduleOutcome, DaylightError>> + Send {
        (**self).schedule(job)
    }
}

impl<T: JobRunner + Send + Sync> JobRunner for Arc<T> {
    fn run(&self, job: ScheduledJob) -> impl Future<Output = Result<(), DaylightError>> + Send {
        (**self).run(job)
    }
}
