//! Job handle and per-activation status.
//!
//! The [`JobHandle`] is returned when a job is submitted to the engine. It is
//! a cloneable, opaque handle over the job's shared lifecycle state: current
//! status, activation number, and the outstanding-task counter. All waits are
//! blocking condvar waits; none of them poll.
//!
//! # Example
//!
//! ```ignore
//! use conveyor::engine::{Conveyor, JobStatus};
//!
//! let handle = engine.submit_job(my_job)?;
//!
//! // Check status without waiting
//! if handle.status() == JobStatus::Producing {
//!     println!("Job is producing tasks");
//! }
//!
//! // Block until the job is done
//! handle.wait();
//! ```

use super::job::JobId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

// =============================================================================
// Job Status
// =============================================================================

/// Per-activation job status.
///
/// Each activation walks the states in order; restart re-enters `Pending`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobStatus {
    /// Registered, driver not yet running.
    #[default]
    Pending,

    /// The production step is running and may still push tasks.
    Producing,

    /// All tasks are submitted; waiting for the outstanding count to
    /// reach zero.
    AwaitingTasks,

    /// Outstanding count reached zero; the completion hook is running.
    Completing,

    /// The completion hook has returned; waiters are woken.
    Done,
}

impl JobStatus {
    /// Returns true if the job has finished its current activation.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if the activation is still in flight.
    pub fn is_active(&self) -> bool {
        !self.is_done()
    }

    /// Returns true once the production step has returned ("all tasks
    /// submitted").
    pub fn is_all_submitted(&self) -> bool {
        matches!(self, Self::AwaitingTasks | Self::Completing | Self::Done)
    }

    /// Returns the status name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Producing => "producing",
            Self::AwaitingTasks => "awaiting_tasks",
            Self::Completing => "completing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Shared Lifecycle State
// =============================================================================

/// Mutable lifecycle state guarded by the handle's mutex.
struct Lifecycle {
    /// Current status of the activation.
    status: JobStatus,

    /// Number of activations started (1 after the first driver runs).
    activation: u64,

    /// When the current activation started producing.
    activation_started: Instant,
}

/// Shared state behind a [`JobHandle`].
///
/// The outstanding counter is atomic and updated without holding the queue's
/// lock; the lifecycle mutex is only taken to transition status and to park
/// waiters on the condvar.
struct JobCore {
    id: JobId,
    lifecycle: Mutex<Lifecycle>,
    cond: Condvar,

    /// Tasks created but not yet finished for the current activation.
    outstanding: AtomicU64,

    /// Tasks created during the current activation (telemetry).
    spawned: AtomicU64,
}

// =============================================================================
// Job Handle
// =============================================================================

/// Handle to a submitted job for status queries and completion waits.
///
/// This handle is cloneable and can be shared across threads. All clones
/// refer to the same underlying job state, and the handle stays valid after
/// the job has been extracted from the engine.
#[derive(Clone)]
pub struct JobHandle {
    core: Arc<JobCore>,
}

impl JobHandle {
    /// Creates a handle with fresh lifecycle state.
    ///
    /// This is called by the engine when a job is submitted.
    pub(crate) fn new(id: JobId) -> Self {
        Self {
            core: Arc::new(JobCore {
                id,
                lifecycle: Mutex::new(Lifecycle {
                    status: JobStatus::Pending,
                    activation: 0,
                    activation_started: Instant::now(),
                }),
                cond: Condvar::new(),
                outstanding: AtomicU64::new(0),
                spawned: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the job's identifier.
    pub fn id(&self) -> &JobId {
        &self.core.id
    }

    /// Returns the current job status.
    ///
    /// This is a non-blocking operation.
    pub fn status(&self) -> JobStatus {
        self.core.lifecycle.lock().unwrap().status
    }

    /// Returns true if the current activation has finished.
    pub fn is_done(&self) -> bool {
        self.status().is_done()
    }

    /// Returns the number of tasks created but not yet finished.
    pub fn outstanding_tasks(&self) -> u64 {
        self.core.outstanding.load(Ordering::Acquire)
    }

    /// Returns the number of tasks created during the current activation.
    pub fn tasks_spawned(&self) -> u64 {
        self.core.spawned.load(Ordering::Relaxed)
    }

    /// Returns the number of activations started so far.
    pub fn activation(&self) -> u64 {
        self.core.lifecycle.lock().unwrap().activation
    }

    /// Returns how long the current activation has been running.
    pub fn activation_elapsed(&self) -> Duration {
        self.core.lifecycle.lock().unwrap().activation_started.elapsed()
    }

    /// Blocks until the job reaches [`JobStatus::Done`].
    ///
    /// Returns immediately if the job is already done. A wait issued after a
    /// restart blocks until the new activation finishes.
    pub fn wait(&self) {
        let mut lifecycle = self.core.lifecycle.lock().unwrap();
        while !lifecycle.status.is_done() {
            lifecycle = self.core.cond.wait(lifecycle).unwrap();
        }
    }

    /// Blocks until the production step has returned ("all tasks
    /// submitted").
    pub fn wait_all_submitted(&self) {
        let mut lifecycle = self.core.lifecycle.lock().unwrap();
        while !lifecycle.status.is_all_submitted() {
            lifecycle = self.core.cond.wait(lifecycle).unwrap();
        }
    }

    // -------------------------------------------------------------------------
    // Engine-internal transitions
    // -------------------------------------------------------------------------

    /// Marks the start of an activation: status `Producing`, activation
    /// number bumped, start instant stamped.
    pub(crate) fn begin_producing(&self) {
        let mut lifecycle = self.core.lifecycle.lock().unwrap();
        lifecycle.status = JobStatus::Producing;
        lifecycle.activation += 1;
        lifecycle.activation_started = Instant::now();
        self.core.cond.notify_all();
    }

    /// Transitions to the given status and wakes all waiters.
    pub(crate) fn set_status(&self, status: JobStatus) {
        let mut lifecycle = self.core.lifecycle.lock().unwrap();
        lifecycle.status = status;
        self.core.cond.notify_all();
    }

    /// Records a newly created task.
    ///
    /// Called under the task queue's lock, before the task becomes poppable,
    /// so a worker can never observe the decrement before this increment.
    pub(crate) fn task_spawned(&self) {
        self.core.outstanding.fetch_add(1, Ordering::AcqRel);
        self.core.spawned.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a finished (or discarded) task, waking the driver when the
    /// outstanding count reaches zero.
    pub(crate) fn task_finished(&self) {
        let previous = self.core.outstanding.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "outstanding task count underflow");

        if previous == 1 {
            // Taking the lifecycle lock orders this notification after any
            // waiter that observed a nonzero count and is about to park.
            let _lifecycle = self.core.lifecycle.lock().unwrap();
            self.core.cond.notify_all();
        }
    }

    /// Blocks until the outstanding-task count reaches zero.
    pub(crate) fn wait_outstanding_zero(&self) {
        let mut lifecycle = self.core.lifecycle.lock().unwrap();
        while self.core.outstanding.load(Ordering::Acquire) != 0 {
            lifecycle = self.core.cond.wait(lifecycle).unwrap();
        }
    }

    /// Resets the lifecycle for a restart.
    ///
    /// Only legal once the current activation is done; returns the current
    /// status otherwise. The outstanding count is already zero at `Done`.
    pub(crate) fn try_reset_for_restart(&self) -> Result<(), JobStatus> {
        let mut lifecycle = self.core.lifecycle.lock().unwrap();
        if !lifecycle.status.is_done() {
            return Err(lifecycle.status);
        }

        debug_assert_eq!(self.core.outstanding.load(Ordering::Acquire), 0);
        lifecycle.status = JobStatus::Pending;
        self.core.spawned.store(0, Ordering::Relaxed);
        Ok(())
    }
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.core.id)
            .field("status", &self.status())
            .field("outstanding", &self.outstanding_tasks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_job_status_is_done() {
        assert!(!JobStatus::Pending.is_done());
        assert!(!JobStatus::Producing.is_done());
        assert!(!JobStatus::AwaitingTasks.is_done());
        assert!(!JobStatus::Completing.is_done());
        assert!(JobStatus::Done.is_done());
    }

    #[test]
    fn test_job_status_is_all_submitted() {
        assert!(!JobStatus::Pending.is_all_submitted());
        assert!(!JobStatus::Producing.is_all_submitted());
        assert!(JobStatus::AwaitingTasks.is_all_submitted());
        assert!(JobStatus::Completing.is_all_submitted());
        assert!(JobStatus::Done.is_all_submitted());
    }

    #[test]
    fn test_job_status_is_active() {
        assert!(JobStatus::Pending.is_active());
        assert!(JobStatus::Producing.is_active());
        assert!(JobStatus::AwaitingTasks.is_active());
        assert!(JobStatus::Completing.is_active());
        assert!(!JobStatus::Done.is_active());
    }

    #[test]
    fn test_job_status_default() {
        assert_eq!(JobStatus::default(), JobStatus::Pending);
    }

    #[test]
    fn test_job_status_display() {
        assert_eq!(format!("{}", JobStatus::Producing), "producing");
        assert_eq!(format!("{}", JobStatus::AwaitingTasks), "awaiting_tasks");
        assert_eq!(format!("{}", JobStatus::Done), "done");
    }

    #[test]
    fn test_handle_initial_state() {
        let handle = JobHandle::new(JobId::new("fresh"));
        assert_eq!(handle.status(), JobStatus::Pending);
        assert_eq!(handle.outstanding_tasks(), 0);
        assert_eq!(handle.tasks_spawned(), 0);
        assert_eq!(handle.activation(), 0);
        assert!(!handle.is_done());
    }

    #[test]
    fn test_handle_counters() {
        let handle = JobHandle::new(JobId::new("counted"));

        handle.task_spawned();
        handle.task_spawned();
        assert_eq!(handle.outstanding_tasks(), 2);
        assert_eq!(handle.tasks_spawned(), 2);

        handle.task_finished();
        assert_eq!(handle.outstanding_tasks(), 1);
        assert_eq!(handle.tasks_spawned(), 2);

        handle.task_finished();
        assert_eq!(handle.outstanding_tasks(), 0);
    }

    #[test]
    fn test_handle_begin_producing_bumps_activation() {
        let handle = JobHandle::new(JobId::new("activated"));

        handle.begin_producing();
        assert_eq!(handle.status(), JobStatus::Producing);
        assert_eq!(handle.activation(), 1);

        handle.set_status(JobStatus::Done);
        handle.try_reset_for_restart().unwrap();
        handle.begin_producing();
        assert_eq!(handle.activation(), 2);
    }

    #[test]
    fn test_handle_wait_wakes_on_done() {
        let handle = JobHandle::new(JobId::new("waited"));
        let waiter = handle.clone();

        let thread = thread::spawn(move || {
            waiter.wait();
            waiter.status()
        });

        // Give the waiter a moment to park.
        thread::sleep(Duration::from_millis(50));
        handle.set_status(JobStatus::Done);

        assert_eq!(thread.join().unwrap(), JobStatus::Done);
    }

    #[test]
    fn test_handle_wait_returns_immediately_when_done() {
        let handle = JobHandle::new(JobId::new("already-done"));
        handle.set_status(JobStatus::Done);
        handle.wait();
    }

    #[test]
    fn test_handle_wait_all_submitted() {
        let handle = JobHandle::new(JobId::new("submitting"));
        let waiter = handle.clone();

        let thread = thread::spawn(move || {
            waiter.wait_all_submitted();
        });

        thread::sleep(Duration::from_millis(50));
        handle.set_status(JobStatus::AwaitingTasks);

        thread.join().unwrap();
    }

    #[test]
    fn test_handle_wait_outstanding_zero() {
        let handle = JobHandle::new(JobId::new("draining"));
        handle.task_spawned();
        handle.task_spawned();

        let waiter = handle.clone();
        let thread = thread::spawn(move || {
            waiter.wait_outstanding_zero();
        });

        thread::sleep(Duration::from_millis(20));
        handle.task_finished();
        thread::sleep(Duration::from_millis(20));
        handle.task_finished();

        thread.join().unwrap();
        assert_eq!(handle.outstanding_tasks(), 0);
    }

    #[test]
    fn test_handle_try_reset_rejected_while_active() {
        let handle = JobHandle::new(JobId::new("busy"));
        handle.begin_producing();

        assert_eq!(handle.try_reset_for_restart(), Err(JobStatus::Producing));
    }

    #[test]
    fn test_handle_try_reset_clears_spawned() {
        let handle = JobHandle::new(JobId::new("reset"));
        handle.begin_producing();
        handle.task_spawned();
        handle.task_finished();
        handle.set_status(JobStatus::Done);

        handle.try_reset_for_restart().unwrap();
        assert_eq!(handle.status(), JobStatus::Pending);
        assert_eq!(handle.tasks_spawned(), 0);
    }

    #[test]
    fn test_handle_clone_shares_state() {
        let handle = JobHandle::new(JobId::new("shared"));
        let clone = handle.clone();

        handle.task_spawned();
        assert_eq!(clone.outstanding_tasks(), 1);
        assert_eq!(clone.id(), handle.id());
    }
}
