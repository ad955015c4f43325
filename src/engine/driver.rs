//! Per-activation job drivers.
//!
//! Each job activation gets a dedicated driver thread that runs the job's
//! production step, marks "all tasks submitted", blocks until the job's
//! outstanding-task count reaches zero, runs the completion hook, and marks
//! the job done. Drivers are tracked and joined at shutdown rather than
//! detached, so failures and shutdown sequencing stay observable.

use super::context::JobContext;
use super::core::EngineShared;
use super::handle::{JobHandle, JobStatus};
use super::job::Job;
use super::telemetry::TelemetryEvent;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Set of driver threads, joined at engine shutdown.
pub(crate) struct DriverSet {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl DriverSet {
    /// Creates an empty driver set.
    pub(crate) fn new() -> Self {
        Self {
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawns a driver thread for one activation of the given job.
    pub(crate) fn spawn(&self, shared: Arc<EngineShared>, job: Arc<dyn Job>, handle: JobHandle) {
        let thread = thread::Builder::new()
            .name(format!("conveyor-driver-{}", handle.id()))
            .spawn(move || drive(shared, job, handle))
            .expect("Failed to spawn driver thread");

        let mut handles = self.handles.lock().unwrap();

        // Reap drivers that already finished so restart-heavy engines don't
        // accumulate join handles.
        let mut live = Vec::with_capacity(handles.len() + 1);
        for finished in handles.drain(..) {
            if finished.is_finished() {
                let _ = finished.join();
            } else {
                live.push(finished);
            }
        }
        live.push(thread);
        *handles = live;
    }

    /// Joins every tracked driver thread.
    ///
    /// Drain-based, so a second call joins nothing (no double-join).
    pub(crate) fn join_all(&self) {
        let drained: Vec<JoinHandle<()>> = {
            let mut handles = self.handles.lock().unwrap();
            handles.drain(..).collect()
        };

        for thread in drained {
            if thread.join().is_err() {
                tracing::error!("Driver thread panicked");
            }
        }
    }
}

/// Driver body: one activation from production to done.
///
/// Client callbacks are run under `catch_unwind` so a faulty job cannot
/// strand its waiters short of `Done` or leave the driver unjoinable.
fn drive(shared: Arc<EngineShared>, job: Arc<dyn Job>, handle: JobHandle) {
    let started = Instant::now();

    handle.begin_producing();
    let activation = handle.activation();
    let job_id = handle.id().clone();

    tracing::debug!(
        job_id = %job_id,
        job_name = job.name(),
        activation,
        "Driver started"
    );
    shared.telemetry.emit(TelemetryEvent::JobStarted {
        job_id: job_id.clone(),
        activation,
    });

    let ctx = JobContext::new(&shared, &handle);
    match panic::catch_unwind(AssertUnwindSafe(|| job.produce(&ctx))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::warn!(job_id = %job_id, error = %err, "Job production ended early");
        }
        Err(_) => {
            tracing::warn!(job_id = %job_id, "Job production panicked");
        }
    }

    handle.set_status(JobStatus::AwaitingTasks);
    shared.telemetry.emit(TelemetryEvent::AllTasksSubmitted {
        job_id: job_id.clone(),
        tasks_spawned: handle.tasks_spawned(),
    });

    handle.wait_outstanding_zero();

    handle.set_status(JobStatus::Completing);
    if panic::catch_unwind(AssertUnwindSafe(|| job.on_complete())).is_err() {
        tracing::warn!(job_id = %job_id, "Completion hook panicked");
    }

    handle.set_status(JobStatus::Done);

    let duration = started.elapsed();
    tracing::debug!(
        job_id = %job_id,
        duration_ms = duration.as_millis() as u64,
        tasks_spawned = handle.tasks_spawned(),
        "Job done"
    );
    shared.telemetry.emit(TelemetryEvent::JobCompleted {
        job_id,
        duration,
        tasks_spawned: handle.tasks_spawned(),
    });
}
