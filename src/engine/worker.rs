//! Worker pool draining the shared task queue.
//!
//! A fixed set of named threads, each looping: pop a task, run it, then
//! decrement the owning job's outstanding count (waking its driver when the
//! count reaches zero). Workers exit when the queue signals shutdown;
//! a worker mid-execution finishes its current task first.

use super::core::EngineShared;
use super::queue::{Popped, QueuedTask};
use super::task::{TaskError, TaskResult};
use super::telemetry::TelemetryEvent;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Fixed set of worker threads.
pub(crate) struct WorkerPool {
    threads: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `count` worker threads draining the engine's queue.
    pub(crate) fn spawn(count: usize, shared: Arc<EngineShared>) -> Self {
        let mut threads = Vec::with_capacity(count);

        for i in 0..count {
            let shared = Arc::clone(&shared);
            let thread = thread::Builder::new()
                .name(format!("conveyor-worker-{}", i))
                .spawn(move || Self::worker_loop(shared))
                .expect("Failed to spawn worker thread");
            threads.push(thread);
        }

        Self { threads }
    }

    /// Returns the number of threads not yet joined.
    pub(crate) fn size(&self) -> usize {
        self.threads.len()
    }

    /// Joins every worker thread.
    ///
    /// Drain-based, so a second call joins nothing (no double-join).
    pub(crate) fn join(&mut self) {
        for thread in self.threads.drain(..) {
            if thread.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }
    }

    /// Worker thread body: pop tasks until shutdown is observed.
    fn worker_loop(shared: Arc<EngineShared>) {
        loop {
            match shared.queue.pop() {
                Popped::Task(queued) => Self::run_task(&shared, queued),
                Popped::Shutdown => break,
            }
        }
        tracing::debug!("Worker exiting");
    }

    /// Runs one task and settles its job's outstanding count.
    ///
    /// A panicking task is captured and recorded as a failed result, so a
    /// client fault can never leave the owning job's count stuck.
    fn run_task(shared: &EngineShared, queued: QueuedTask) {
        let QueuedTask { handle, mut task } = queued;
        let task_name = task.name().to_string();
        let job_id = handle.id().clone();

        shared.telemetry.emit(TelemetryEvent::TaskStarted {
            job_id: job_id.clone(),
            task_name: task_name.clone(),
        });

        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| task.run()))
            .unwrap_or_else(|payload| TaskResult::Failed(TaskError::new(panic_message(&*payload))));

        if let TaskResult::Failed(err) = &result {
            tracing::warn!(
                job_id = %job_id,
                task = %task_name,
                error = %err,
                "Task failed"
            );
        }

        handle.task_finished();

        shared.telemetry.emit(TelemetryEvent::TaskCompleted {
            job_id,
            task_name,
            result: result.kind(),
            duration: started.elapsed(),
        });
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("task panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("task panicked: {}", message)
    } else {
        "task panicked".to_string()
    }
}
