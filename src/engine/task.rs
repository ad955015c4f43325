//! Task trait and execution results.
//!
//! A task is one independently executable unit of work belonging to exactly
//! one job. Tasks are pushed during the owning job's production step, drained
//! from the shared queue by the worker pool, and executed exactly once.

use std::fmt;

/// A single unit of work executed by a worker thread.
///
/// Tasks are consumed exactly once: removed from the queue by exactly one
/// worker, executed, then discarded after decrementing the owning job's
/// outstanding-task count.
///
/// # Client Obligations
///
/// Tasks must be non-blocking by policy: a task that blocks indefinitely
/// starves a worker slot for its whole duration. The engine does not enforce
/// this. A task that panics is caught by the worker, recorded as a failed
/// result, and still counts as finished for its job's lifecycle.
pub trait Task: Send + 'static {
    /// Returns a short name for logging/display.
    fn name(&self) -> &str {
        "task"
    }

    /// Executes this task.
    ///
    /// Called exactly once, by exactly one worker thread. The task owns its
    /// payload (`&mut self`); results intended for the job's completion hook
    /// belong in shared state (atomics, locks) the task was constructed with.
    fn run(&mut self) -> TaskResult;
}

/// Result of a task execution.
#[derive(Debug)]
pub enum TaskResult {
    /// Task completed successfully.
    Success,

    /// Task failed with an error.
    Failed(TaskError),
}

impl TaskResult {
    /// Returns the result kind for telemetry and logging.
    pub fn kind(&self) -> TaskResultKind {
        match self {
            Self::Success => TaskResultKind::Success,
            Self::Failed(_) => TaskResultKind::Failed,
        }
    }

    /// Returns true if the task succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Discriminant of a [`TaskResult`], cheap to copy into telemetry events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskResultKind {
    /// The task completed successfully.
    Success,
    /// The task failed (returned an error or panicked).
    Failed,
}

impl TaskResultKind {
    /// Returns the kind name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error raised by a failed task execution.
#[derive(Clone, Debug)]
pub struct TaskError {
    message: String,
}

impl TaskError {
    /// Creates a new task error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_result_kind() {
        assert_eq!(TaskResult::Success.kind(), TaskResultKind::Success);
        assert_eq!(
            TaskResult::Failed(TaskError::new("boom")).kind(),
            TaskResultKind::Failed
        );
    }

    #[test]
    fn test_task_result_is_success() {
        assert!(TaskResult::Success.is_success());
        assert!(!TaskResult::Failed(TaskError::new("boom")).is_success());
    }

    #[test]
    fn test_task_result_kind_display() {
        assert_eq!(format!("{}", TaskResultKind::Success), "success");
        assert_eq!(format!("{}", TaskResultKind::Failed), "failed");
    }

    #[test]
    fn test_task_error_message() {
        let err = TaskError::new("worker exploded");
        assert_eq!(err.message(), "worker exploded");
        assert_eq!(format!("{}", err), "worker exploded");
    }

    #[test]
    fn test_default_task_name() {
        struct Anon;
        impl Task for Anon {
            fn run(&mut self) -> TaskResult {
                TaskResult::Success
            }
        }

        assert_eq!(Anon.name(), "task");
    }
}
