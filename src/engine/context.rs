//! Production context handed to a job's production step.
//!
//! The context is the explicit capability through which a job pushes its
//! tasks into the engine. It is borrowed for the duration of the production
//! step and never stored, so no ambient engine back-pointer exists.

use super::core::EngineShared;
use super::error::SubmitTaskError;
use super::handle::JobHandle;
use super::job::JobId;
use super::task::Task;

/// Capability for submitting tasks during a job's production step.
///
/// Every task submitted through this context is tagged with the owning
/// job's handle; workers decrement that job's outstanding count when the
/// task finishes.
pub struct JobContext<'a> {
    engine: &'a EngineShared,
    handle: &'a JobHandle,
}

impl<'a> JobContext<'a> {
    /// Creates a context bound to the given job.
    ///
    /// This is called by the driver at the start of an activation.
    pub(crate) fn new(engine: &'a EngineShared, handle: &'a JobHandle) -> Self {
        Self { engine, handle }
    }

    /// Returns the identifier of the producing job.
    pub fn job_id(&self) -> &JobId {
        self.handle.id()
    }

    /// Returns the number of this job's tasks created but not yet finished.
    pub fn outstanding_tasks(&self) -> u64 {
        self.handle.outstanding_tasks()
    }

    /// Submits a task under the producing job's handle.
    ///
    /// With a bounded queue this blocks while the queue is at capacity,
    /// until a worker frees a slot.
    ///
    /// # Errors
    ///
    /// Fails with [`SubmitTaskError::ShuttingDown`] once engine shutdown has
    /// begun; the rejected task is carried back inside the error.
    pub fn submit(&self, task: impl Task) -> Result<(), SubmitTaskError> {
        self.submit_boxed(Box::new(task))
    }

    /// Submits a pre-boxed task under the producing job's handle.
    ///
    /// This is useful when working with factory patterns that return
    /// `Box<dyn Task>`.
    pub fn submit_boxed(&self, task: Box<dyn Task>) -> Result<(), SubmitTaskError> {
        self.engine.enqueue(self.handle, task)
    }
}
