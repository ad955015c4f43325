//! Job Execution Engine
//!
//! This module provides the conveyor engine: a fixed pool of worker threads
//! consuming a shared, optionally bounded task queue, with jobs that produce
//! tasks dynamically and are notified exactly once when all of their tasks
//! have finished.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Conveyor                             │
//! │  Submit jobs/tasks, query/restart/extract, shut down        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌──────────────┐  ┌───────────────────┐   │
//! │  │ TaskQueue   │  │ JobRegistry  │  │ Telemetry Sink    │   │
//! │  │ (bounded)   │  │ (uniqueness) │  │                   │   │
//! │  └──────┬──────┘  └──────────────┘  └───────────────────┘   │
//! │         │                                                   │
//! │  ┌──────▼──────┐       ┌──────────────────────────────┐     │
//! │  │ WorkerPool  │       │ Job drivers (one/activation) │     │
//! │  │ pop→run→dec │       │ produce→await zero→complete  │     │
//! │  └─────────────┘       └──────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Job**: a client-defined unit of work that produces tasks. A job has a
//!   stable [`JobId`], a production step invoked exactly once per activation,
//!   and a completion hook invoked exactly once after all of its tasks
//!   finish.
//!
//! - **Task**: one independently executable unit of work belonging to
//!   exactly one job. Tasks are consumed exactly once by exactly one worker.
//!
//! - **Driver**: a dedicated thread per job activation that runs the
//!   production step, waits for the job's outstanding-task counter to reach
//!   zero, then runs the completion hook and marks the job done.
//!
//! - **Backpressure**: with a nonzero queue capacity, task submission blocks
//!   while the queue is full, until a worker frees a slot.
//!
//! # Example
//!
//! ```ignore
//! use conveyor::engine::{
//!     Conveyor, EngineConfig, Job, JobContext, JobId, SubmitTaskError,
//!     Task, TaskResult,
//! };
//!
//! // Define a task
//! struct ComputeTask { input: u64 }
//!
//! impl Task for ComputeTask {
//!     fn name(&self) -> &str { "Compute" }
//!     fn run(&mut self) -> TaskResult {
//!         // ... compute something ...
//!         TaskResult::Success
//!     }
//! }
//!
//! // Define a job
//! struct ComputeJob { id: JobId }
//!
//! impl Job for ComputeJob {
//!     fn id(&self) -> JobId { self.id.clone() }
//!     fn name(&self) -> &str { "ComputeJob" }
//!     fn produce(&self, ctx: &JobContext<'_>) -> Result<(), SubmitTaskError> {
//!         for input in 0..1000 {
//!             ctx.submit(ComputeTask { input })?;
//!         }
//!         Ok(())
//!     }
//!     fn on_complete(&self) { /* aggregate results */ }
//! }
//!
//! // Run the engine
//! let engine = Conveyor::new(EngineConfig::default());
//! let handle = engine.submit_job(ComputeJob { id: JobId::new("compute-1") })?;
//! handle.wait();
//! engine.shutdown();
//! ```
//!
//! # Telemetry
//!
//! The engine emits structured events via the [`TelemetrySink`] trait:
//! job lifecycle (submitted, started, completed, restarted), task lifecycle
//! (enqueued, started, completed), and shutdown accounting.

// Module declarations
mod config;
mod context;
mod core;
mod driver;
mod error;
mod handle;
mod job;
mod queue;
mod registry;
mod task;
mod telemetry;
mod watchdog;
mod worker;

// Configuration
pub use config::{EngineConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_THREADS};

// Job types
pub use job::{Job, JobId};

// Task types
pub use task::{Task, TaskError, TaskResult, TaskResultKind};

// Handle and status
pub use handle::{JobHandle, JobStatus};

// Production context
pub use context::JobContext;

// Errors
pub use error::{RestartError, SubmitJobError, SubmitTaskError};

// Registry statistics
pub use registry::RegistryStats;

// Telemetry
pub use telemetry::{NullTelemetrySink, TelemetryEvent, TelemetrySink, TracingTelemetrySink};

// Stall detection
pub use watchdog::{STALL_DETECTION_THRESHOLD_SECS, STALL_WATCHDOG_INTERVAL_SECS};

// Engine
pub use core::Conveyor;
