//! Job trait and job identity.
//!
//! A job is a client-defined unit of work that produces tasks for parallel
//! execution and exposes a one-time completion hook.
//!
//! # Example
//!
//! ```ignore
//! use conveyor::engine::{Job, JobContext, JobId, SubmitTaskError};
//!
//! struct MyJob {
//!     id: JobId,
//! }
//!
//! impl Job for MyJob {
//!     fn id(&self) -> JobId { self.id.clone() }
//!     fn name(&self) -> &str { "MyJob" }
//!     fn produce(&self, ctx: &JobContext<'_>) -> Result<(), SubmitTaskError> {
//!         ctx.submit(MyTask::new())?;
//!         Ok(())
//!     }
//! }
//! ```

use super::context::JobContext;
use super::error::SubmitTaskError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for generating unique job IDs.
static JOB_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a job.
///
/// Job IDs are strings that identify a job for the lifetime of its
/// registration. They can be generated automatically or constructed from
/// meaningful data (like a work-unit key).
///
/// # Example
///
/// ```ignore
/// use conveyor::engine::JobId;
///
/// // Auto-generated unique ID
/// let id = JobId::auto();
///
/// // ID from meaningful data
/// let id = JobId::new("resample-60_-146");
/// ```
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct JobId(String);

impl JobId {
    /// Creates a new job ID with the given string value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a unique auto-generated job ID.
    ///
    /// The ID format is `job-{counter}` where counter is a monotonically
    /// increasing number. This is suitable for jobs that don't need
    /// meaningful IDs.
    pub fn auto() -> Self {
        let counter = JOB_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("job-{}", counter))
    }

    /// Returns the string value of this job ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A client-defined unit of work that produces tasks.
///
/// Jobs are the primary unit of work submission. Each job:
/// - Declares a stable identifier, registered at most once at any time
/// - Has a production step that pushes tasks into the engine's queue
/// - Has a completion hook that runs once all of its tasks finish
///
/// # Lifecycle
///
/// 1. The job is submitted via [`Conveyor::submit_job`](super::Conveyor::submit_job)
/// 2. A driver invokes [`produce`](Job::produce) exactly once
/// 3. Worker threads execute the produced tasks
/// 4. Once production has returned and every task has finished,
///    [`on_complete`](Job::on_complete) runs exactly once
/// 5. The job is observably done; waiters wake
/// 6. Optionally the job is restarted (a fresh activation) or extracted
///    (ownership returned to the caller)
///
/// # Thread Safety
///
/// The engine shares the job across the driver thread and the caller
/// (`Arc<dyn Job>`), so implementations must be `Send + Sync`. State written
/// by tasks belongs in the tasks themselves or behind shared interior
/// mutability (atomics, locks).
pub trait Job: Send + Sync + 'static {
    /// Returns the identifier for this job.
    ///
    /// Submitting a second job with an identifier that is already registered
    /// is rejected, with ownership returned to the caller.
    fn id(&self) -> JobId;

    /// Returns a human-readable name for logging/display.
    ///
    /// This should be a short, descriptive name like "TileResample" or
    /// "IndexRebuild".
    fn name(&self) -> &str;

    /// Produces this job's tasks.
    ///
    /// Called exactly once per activation. Tasks are pushed through the
    /// given [`JobContext`]; with a bounded queue the pushes block under
    /// backpressure. Producing zero tasks is valid: the job completes as
    /// soon as production returns.
    ///
    /// # Errors
    ///
    /// Submission fails with [`SubmitTaskError::ShuttingDown`] once engine
    /// shutdown has begun. Returning an error ends production early; the
    /// already-submitted tasks still run and the job still completes.
    fn produce(&self, ctx: &JobContext<'_>) -> Result<(), SubmitTaskError>;

    /// Called exactly once per activation, after every produced task has
    /// finished and before the job is observably done to any waiter.
    ///
    /// The default implementation does nothing.
    fn on_complete(&self) {}
}
