//! Error types for the engine's operation surface.
//!
//! Rejected submissions carry the job or task back inside the error, so
//! ownership is returned to the caller instead of being dropped by the
//! engine.

use super::handle::JobStatus;
use super::job::{Job, JobId};
use super::task::Task;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by [`Conveyor::submit_job`](super::Conveyor::submit_job).
#[derive(Error)]
pub enum SubmitJobError {
    /// A job with the same identifier is already registered.
    ///
    /// The registry is unchanged, no driver was started, and the rejected
    /// job rides along for recovery via [`into_job`](Self::into_job).
    #[error("job '{id}' is already registered")]
    DuplicateId { id: JobId, job: Arc<dyn Job> },

    /// Engine shutdown has begun; no new jobs are accepted.
    #[error("engine is shutting down")]
    ShuttingDown { job: Arc<dyn Job> },
}

impl SubmitJobError {
    /// Returns ownership of the rejected job.
    pub fn into_job(self) -> Arc<dyn Job> {
        match self {
            Self::DuplicateId { job, .. } | Self::ShuttingDown { job } => job,
        }
    }
}

impl fmt::Debug for SubmitJobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { id, .. } => f
                .debug_struct("DuplicateId")
                .field("id", id)
                .finish_non_exhaustive(),
            Self::ShuttingDown { .. } => f.debug_struct("ShuttingDown").finish_non_exhaustive(),
        }
    }
}

/// Errors raised when submitting a task.
#[derive(Error)]
pub enum SubmitTaskError {
    /// Engine shutdown has begun; no new tasks are accepted.
    ///
    /// The rejected task rides along for recovery via
    /// [`into_task`](Self::into_task).
    #[error("engine is shutting down")]
    ShuttingDown { task: Box<dyn Task> },
}

impl SubmitTaskError {
    /// Returns ownership of the rejected task.
    pub fn into_task(self) -> Box<dyn Task> {
        match self {
            Self::ShuttingDown { task } => task,
        }
    }
}

impl fmt::Debug for SubmitTaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShuttingDown { task } => f
                .debug_struct("ShuttingDown")
                .field("task", &task.name())
                .finish(),
        }
    }
}

/// Errors raised by [`Conveyor::restart_job`](super::Conveyor::restart_job).
#[derive(Debug, Error)]
pub enum RestartError {
    /// The job's current activation has not reached done yet.
    #[error("job '{id}' is still active (status: {status})")]
    StillActive { id: JobId, status: JobStatus },

    /// Engine shutdown has begun; restarts are no longer accepted.
    #[error("engine is shutting down")]
    ShuttingDown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::context::JobContext;
    use super::super::task::TaskResult;

    struct StubJob;

    impl Job for StubJob {
        fn id(&self) -> JobId {
            JobId::new("stub")
        }
        fn name(&self) -> &str {
            "Stub"
        }
        fn produce(&self, _ctx: &JobContext<'_>) -> Result<(), SubmitTaskError> {
            Ok(())
        }
    }

    struct StubTask;

    impl Task for StubTask {
        fn name(&self) -> &str {
            "Stub"
        }
        fn run(&mut self) -> TaskResult {
            TaskResult::Success
        }
    }

    #[test]
    fn test_submit_job_error_display() {
        let err = SubmitJobError::DuplicateId {
            id: JobId::new("dup"),
            job: Arc::new(StubJob),
        };
        assert_eq!(format!("{}", err), "job 'dup' is already registered");

        let err = SubmitJobError::ShuttingDown {
            job: Arc::new(StubJob),
        };
        assert_eq!(format!("{}", err), "engine is shutting down");
    }

    #[test]
    fn test_submit_job_error_returns_ownership() {
        let err = SubmitJobError::DuplicateId {
            id: JobId::new("dup"),
            job: Arc::new(StubJob),
        };
        let job = err.into_job();
        assert_eq!(job.name(), "Stub");
    }

    #[test]
    fn test_submit_task_error_returns_ownership() {
        let err = SubmitTaskError::ShuttingDown {
            task: Box::new(StubTask),
        };
        assert_eq!(format!("{}", err), "engine is shutting down");

        let task = err.into_task();
        assert_eq!(task.name(), "Stub");
    }

    #[test]
    fn test_restart_error_display() {
        let err = RestartError::StillActive {
            id: JobId::new("busy"),
            status: JobStatus::Producing,
        };
        assert_eq!(
            format!("{}", err),
            "job 'busy' is still active (status: producing)"
        );
    }
}
