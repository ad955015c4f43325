//! Engine core - composition and public operation surface.
//!
//! The [`Conveyor`] composes the task queue, the worker pool, the job
//! registry, the per-activation drivers, and the stall watchdog. It is the
//! single entry point clients use to submit jobs and tasks, query/restart/
//! extract jobs, and shut down.

use super::config::EngineConfig;
use super::driver::DriverSet;
use super::error::{RestartError, SubmitJobError, SubmitTaskError};
use super::handle::JobHandle;
use super::job::{Job, JobId};
use super::queue::{QueuedTask, TaskQueue};
use super::registry::{JobEntry, JobRegistry, RegistryStats};
use super::task::Task;
use super::telemetry::{NullTelemetrySink, TelemetryEvent, TelemetrySink};
use super::watchdog::StallWatchdog;
use super::worker::WorkerPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

// =============================================================================
// Shared Engine State
// =============================================================================

/// State shared between the engine facade, workers, drivers, and the
/// watchdog.
///
/// The task queue and job registry are the only cross-thread mutable
/// structures; per-job outstanding counters live in the job handles and are
/// updated without holding the queue's lock.
pub(crate) struct EngineShared {
    /// Engine configuration.
    pub(crate) config: EngineConfig,

    /// Pending tasks, FIFO across all producers.
    pub(crate) queue: TaskQueue,

    /// Registered jobs by id.
    pub(crate) registry: JobRegistry,

    /// Telemetry sink for emitting events.
    pub(crate) telemetry: Arc<dyn TelemetrySink>,

    /// Set once shutdown begins; later submissions are rejected.
    pub(crate) shutting_down: AtomicBool,
}

impl EngineShared {
    /// Creates shared state for a fresh engine.
    pub(crate) fn new(config: EngineConfig, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            queue: TaskQueue::new(config.queue_capacity),
            registry: JobRegistry::new(),
            telemetry,
            shutting_down: AtomicBool::new(false),
            config,
        }
    }

    /// Returns true once shutdown has begun.
    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Routes a task into the queue under the given job's handle.
    ///
    /// Blocks under backpressure with a bounded queue. The job's outstanding
    /// count is incremented by the queue, under its lock, before the task
    /// becomes poppable.
    pub(crate) fn enqueue(
        &self,
        handle: &JobHandle,
        task: Box<dyn Task>,
    ) -> Result<(), SubmitTaskError> {
        if self.is_shutting_down() {
            return Err(SubmitTaskError::ShuttingDown { task });
        }

        let task_name = task.name().to_string();
        match self.queue.push(QueuedTask {
            handle: handle.clone(),
            task,
        }) {
            Ok(depth) => {
                self.telemetry.emit(TelemetryEvent::TaskEnqueued {
                    job_id: handle.id().clone(),
                    task_name,
                    queue_depth: depth,
                });
                Ok(())
            }
            Err(rejected) => Err(SubmitTaskError::ShuttingDown {
                task: rejected.task,
            }),
        }
    }
}

// =============================================================================
// Conveyor
// =============================================================================

/// The conveyor engine.
///
/// Composes a fixed worker pool, a bounded task queue, a job registry, and
/// per-activation job drivers. Workers and the stall watchdog start
/// immediately on construction and run until [`shutdown`](Self::shutdown),
/// which is also invoked on drop.
///
/// # Example
///
/// ```ignore
/// use conveyor::engine::{Conveyor, EngineConfig};
///
/// let engine = Conveyor::new(EngineConfig::default().with_queue_capacity(256));
///
/// let handle = engine.submit_job(my_job)?;
/// handle.wait();
///
/// engine.shutdown();
/// ```
pub struct Conveyor {
    shared: Arc<EngineShared>,
    workers: Mutex<WorkerPool>,
    drivers: DriverSet,
    watchdog: Mutex<Option<StallWatchdog>>,
}

impl Conveyor {
    /// Creates an engine with the given configuration and no telemetry.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_telemetry(config, Arc::new(NullTelemetrySink))
    }

    /// Creates an engine with the given configuration and telemetry sink.
    pub fn with_telemetry(config: EngineConfig, telemetry: Arc<dyn TelemetrySink>) -> Self {
        let worker_count = config.resolved_worker_threads();
        let shared = Arc::new(EngineShared::new(config, telemetry));

        let workers = WorkerPool::spawn(worker_count, Arc::clone(&shared));
        let watchdog = StallWatchdog::spawn(Arc::clone(&shared));

        info!(
            workers = worker_count,
            queue_capacity = shared.config.queue_capacity,
            "Engine started"
        );

        Self {
            shared,
            workers: Mutex::new(workers),
            drivers: DriverSet::new(),
            watchdog: Mutex::new(Some(watchdog)),
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Submits a job and starts a driver for its first activation.
    ///
    /// Returns a [`JobHandle`] for status queries and completion waits.
    ///
    /// # Errors
    ///
    /// - [`SubmitJobError::DuplicateId`] if a job with the same id is
    ///   already registered; the registry is unchanged, no driver starts,
    ///   and the job rides back inside the error.
    /// - [`SubmitJobError::ShuttingDown`] once shutdown has begun.
    pub fn submit_job(&self, job: impl Job) -> Result<JobHandle, SubmitJobError> {
        self.submit_job_arc(Arc::new(job))
    }

    /// Submits a pre-boxed job.
    ///
    /// This is useful when working with factory patterns that return
    /// `Arc<dyn Job>`. Semantics match [`submit_job`](Self::submit_job).
    pub fn submit_job_arc(&self, job: Arc<dyn Job>) -> Result<JobHandle, SubmitJobError> {
        if self.shared.is_shutting_down() {
            return Err(SubmitJobError::ShuttingDown { job });
        }

        let id = job.id();
        let handle = JobHandle::new(id.clone());

        if let Err(rejected) = self
            .shared
            .registry
            .try_insert(JobEntry::new(Arc::clone(&job), handle.clone()))
        {
            warn!(job_id = %id, "Rejected duplicate job submission");
            return Err(SubmitJobError::DuplicateId {
                id,
                job: rejected.job,
            });
        }

        info!(job_id = %id, job_name = job.name(), "Job submitted");
        self.shared.telemetry.emit(TelemetryEvent::JobSubmitted {
            job_id: id.clone(),
            name: job.name().to_string(),
        });

        self.drivers
            .spawn(Arc::clone(&self.shared), job, handle.clone());

        Ok(handle)
    }

    /// Submits a task under the given job's handle.
    ///
    /// Jobs normally push their tasks through the [`JobContext`] passed to
    /// their production step; this is the handle-based equivalent for
    /// callers holding a [`JobHandle`]. Tasks are expected to be submitted
    /// while their job is producing (caller obligation, not verified).
    ///
    /// With a bounded queue this blocks while the queue is at capacity.
    ///
    /// [`JobContext`]: super::JobContext
    ///
    /// # Errors
    ///
    /// Fails with [`SubmitTaskError::ShuttingDown`] once shutdown has begun.
    pub fn submit_task(&self, handle: &JobHandle, task: impl Task) -> Result<(), SubmitTaskError> {
        self.shared.enqueue(handle, Box::new(task))
    }

    /// Looks up the handle of a registered job.
    pub fn job_handle(&self, id: &JobId) -> Option<JobHandle> {
        self.shared.registry.get(id).map(|entry| entry.handle)
    }

    /// Removes a job from the registry and returns ownership.
    ///
    /// Returns `None` for unknown ids, including ids already extracted.
    ///
    /// # Preconditions
    ///
    /// Intended to be called once the job is done
    /// ([`is_job_done`](Self::is_job_done)). Extracting a still-running job
    /// is memory-safe (the running activation keeps its own shared
    /// reference) but the observable results are unspecified; that ordering
    /// is the caller's responsibility.
    pub fn extract_job(&self, id: &JobId) -> Option<Arc<dyn Job>> {
        self.shared.registry.extract(id).map(|entry| entry.job)
    }

    /// Restarts a completed job: resets its lifecycle and starts a fresh
    /// activation.
    ///
    /// An unknown id is a benign no-op. A wait issued after a restart blocks
    /// until the new activation finishes.
    ///
    /// # Errors
    ///
    /// - [`RestartError::StillActive`] if the job's current activation has
    ///   not reached done.
    /// - [`RestartError::ShuttingDown`] once shutdown has begun.
    pub fn restart_job(&self, id: &JobId) -> Result<(), RestartError> {
        if self.shared.is_shutting_down() {
            return Err(RestartError::ShuttingDown);
        }

        let Some(entry) = self.shared.registry.get(id) else {
            return Ok(());
        };

        match entry.handle.try_reset_for_restart() {
            Err(status) => Err(RestartError::StillActive {
                id: id.clone(),
                status,
            }),
            Ok(()) => {
                info!(job_id = %id, "Job restarted");
                self.shared
                    .telemetry
                    .emit(TelemetryEvent::JobRestarted { job_id: id.clone() });

                self.drivers
                    .spawn(Arc::clone(&self.shared), entry.job, entry.handle);
                Ok(())
            }
        }
    }

    /// Returns true if the job has finished its current activation.
    ///
    /// An unknown id reports `true`, vacuously.
    pub fn is_job_done(&self, id: &JobId) -> bool {
        match self.shared.registry.get(id) {
            Some(entry) => entry.handle.is_done(),
            None => true,
        }
    }

    /// Blocks until the job finishes its current activation.
    ///
    /// Returns immediately for unknown ids.
    pub fn wait_job_done(&self, id: &JobId) {
        // The entry is cloned out so no registry lock is held while waiting.
        if let Some(entry) = self.shared.registry.get(id) {
            entry.handle.wait();
        }
    }

    /// Returns a snapshot of registry statistics.
    pub fn registry_stats(&self) -> RegistryStats {
        self.shared.registry.stats()
    }

    /// Shuts the engine down: discards queued tasks, joins every worker and
    /// driver thread, and stops the watchdog.
    ///
    /// Discarded tasks count as finished for their jobs' lifecycles, so
    /// in-flight activations still converge and completion hooks still run
    /// exactly once; the loss is logged and emitted as telemetry. Workers
    /// mid-execution finish their current task first.
    ///
    /// Idempotent and safe to call concurrently; also invoked on drop.
    pub fn shutdown(&self) {
        let first = !self.shared.shutting_down.swap(true, Ordering::SeqCst);
        if first {
            info!("Engine shutting down");
        }

        let discarded = self.shared.queue.shutdown();
        if !discarded.is_empty() {
            warn!(count = discarded.len(), "Discarding queued tasks at shutdown");
            self.shared.telemetry.emit(TelemetryEvent::TasksDiscarded {
                count: discarded.len(),
            });
            for queued in discarded {
                queued.handle.task_finished();
            }
        }

        let workers_joined = {
            let mut workers = self.workers.lock().unwrap();
            let count = workers.size();
            workers.join();
            count
        };

        self.drivers.join_all();

        if let Some(watchdog) = self.watchdog.lock().unwrap().take() {
            watchdog.stop();
        }

        if first {
            self.shared
                .telemetry
                .emit(TelemetryEvent::ShutdownComplete { workers_joined });
            info!(workers_joined, "Engine shutdown complete");
        }
    }
}

impl Drop for Conveyor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Conveyor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conveyor")
            .field("queue_capacity", &self.shared.queue.capacity())
            .field("queued_tasks", &self.shared.queue.len())
            .field("active_jobs", &self.shared.registry.active_count())
            .field("shutting_down", &self.shared.is_shutting_down())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::JobContext;
    use crate::engine::handle::JobStatus;
    use crate::engine::task::{Task, TaskResult};
    use std::sync::atomic::AtomicUsize;

    struct NoopTask;

    impl Task for NoopTask {
        fn run(&mut self) -> TaskResult {
            TaskResult::Success
        }
    }

    struct SimpleJob {
        id: &'static str,
        tasks: usize,
        hook_runs: Arc<AtomicUsize>,
    }

    impl SimpleJob {
        fn new(id: &'static str, tasks: usize) -> (Self, Arc<AtomicUsize>) {
            let hook_runs = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    id,
                    tasks,
                    hook_runs: Arc::clone(&hook_runs),
                },
                hook_runs,
            )
        }
    }

    impl Job for SimpleJob {
        fn id(&self) -> JobId {
            JobId::new(self.id)
        }
        fn name(&self) -> &str {
            "Simple"
        }
        fn produce(&self, ctx: &JobContext<'_>) -> Result<(), SubmitTaskError> {
            for _ in 0..self.tasks {
                ctx.submit(NoopTask)?;
            }
            Ok(())
        }
        fn on_complete(&self) {
            self.hook_runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_engine() -> Conveyor {
        Conveyor::new(EngineConfig::default().with_worker_threads(2))
    }

    #[test]
    fn test_engine_creation() {
        let engine = test_engine();
        assert_eq!(engine.config().worker_threads, 2);
        assert_eq!(engine.registry_stats().active_jobs, 0);
    }

    #[test]
    fn test_submit_and_wait() {
        let engine = test_engine();
        let (job, hook_runs) = SimpleJob::new("simple", 4);

        let handle = engine.submit_job(job).unwrap();
        handle.wait();

        assert_eq!(handle.status(), JobStatus::Done);
        assert_eq!(hook_runs.load(Ordering::SeqCst), 1);
        assert!(engine.is_job_done(handle.id()));

        engine.shutdown();
    }

    #[test]
    fn test_duplicate_submission_rejected() {
        let engine = test_engine();
        let (first, _) = SimpleJob::new("dup", 0);
        let (second, second_hook) = SimpleJob::new("dup", 0);

        let handle = engine.submit_job(first).unwrap();

        let err = engine.submit_job(second).unwrap_err();
        assert!(matches!(err, SubmitJobError::DuplicateId { .. }));
        let recovered = err.into_job();
        assert_eq!(recovered.id().as_str(), "dup");

        // The registered job is unaffected and the rejected one never ran.
        handle.wait();
        assert_eq!(engine.registry_stats().active_jobs, 1);
        assert_eq!(second_hook.load(Ordering::SeqCst), 0);

        engine.shutdown();
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let engine = test_engine();
        engine.shutdown();

        let (job, _) = SimpleJob::new("late", 0);
        let err = engine.submit_job(job).unwrap_err();
        assert!(matches!(err, SubmitJobError::ShuttingDown { .. }));
    }

    #[test]
    fn test_submit_task_after_shutdown_fails() {
        let engine = test_engine();
        let (job, _) = SimpleJob::new("tasked", 0);
        let handle = engine.submit_job(job).unwrap();
        handle.wait();

        engine.shutdown();

        let err = engine.submit_task(&handle, NoopTask).unwrap_err();
        assert!(matches!(err, SubmitTaskError::ShuttingDown { .. }));
    }

    #[test]
    fn test_unknown_id_is_vacuously_done() {
        let engine = test_engine();
        let unknown = JobId::new("never-registered");

        assert!(engine.is_job_done(&unknown));
        engine.wait_job_done(&unknown);
        assert!(engine.job_handle(&unknown).is_none());
        assert!(engine.restart_job(&unknown).is_ok());

        engine.shutdown();
    }

    #[test]
    fn test_extract_after_done() {
        let engine = test_engine();
        let (job, _) = SimpleJob::new("extracted", 2);

        let handle = engine.submit_job(job).unwrap();
        handle.wait();

        let extracted = engine.extract_job(handle.id()).unwrap();
        assert_eq!(extracted.id().as_str(), "extracted");

        assert!(engine.extract_job(handle.id()).is_none());
        assert_eq!(engine.registry_stats().active_jobs, 0);

        // The handle outlives extraction.
        assert!(handle.is_done());

        engine.shutdown();
    }

    #[test]
    fn test_restart_rejected_while_active() {
        // No workers would drain a bounded gap here, so use a job whose
        // production blocks until we let it finish.
        use std::sync::mpsc;

        struct GatedJob {
            gate: std::sync::Mutex<mpsc::Receiver<()>>,
        }
        impl Job for GatedJob {
            fn id(&self) -> JobId {
                JobId::new("gated")
            }
            fn name(&self) -> &str {
                "Gated"
            }
            fn produce(&self, _ctx: &JobContext<'_>) -> Result<(), SubmitTaskError> {
                let _ = self.gate.lock().unwrap().recv();
                Ok(())
            }
        }

        let engine = test_engine();
        let (gate_tx, gate_rx) = mpsc::channel();
        let handle = engine
            .submit_job(GatedJob {
                gate: std::sync::Mutex::new(gate_rx),
            })
            .unwrap();

        // Producing: restart must be rejected with a state error.
        let err = engine.restart_job(handle.id()).unwrap_err();
        assert!(matches!(err, RestartError::StillActive { .. }));

        drop(gate_tx);
        handle.wait();

        engine.shutdown();
    }

    #[test]
    fn test_restart_after_shutdown_fails() {
        let engine = test_engine();
        let (job, _) = SimpleJob::new("restarted", 0);
        let handle = engine.submit_job(job).unwrap();
        handle.wait();

        engine.shutdown();

        let err = engine.restart_job(handle.id()).unwrap_err();
        assert!(matches!(err, RestartError::ShuttingDown));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let engine = test_engine();
        engine.shutdown();
        engine.shutdown();
    }

    #[test]
    fn test_drop_shuts_down() {
        let engine = test_engine();
        let (job, hook_runs) = SimpleJob::new("dropped", 8);
        let handle = engine.submit_job(job).unwrap();
        handle.wait();

        drop(engine);
        assert_eq!(hook_runs.load(Ordering::SeqCst), 1);
    }
}
