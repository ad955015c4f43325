//! Telemetry for engine observability.
//!
//! Jobs and tasks emit telemetry events via a sink abstraction. The engine
//! doesn't know how events are consumed—this follows the "emit, don't
//! present" pattern: consumers (logging, metrics, UI) decide how to present
//! or aggregate them.
//!
//! # Example
//!
//! ```ignore
//! use conveyor::engine::{TelemetryEvent, TelemetrySink};
//!
//! struct LoggingSink;
//!
//! impl TelemetrySink for LoggingSink {
//!     fn emit(&self, event: TelemetryEvent) {
//!         tracing::info!(?event, "Engine event");
//!     }
//! }
//! ```

use super::job::JobId;
use super::task::TaskResultKind;
use std::time::Duration;

// =============================================================================
// Telemetry Events
// =============================================================================

/// Events emitted during job/task execution.
///
/// These events provide observability into the engine's behavior without
/// coupling it to any specific presentation or storage mechanism.
#[derive(Clone, Debug)]
pub enum TelemetryEvent {
    // -------------------------------------------------------------------------
    // Job Lifecycle Events
    // -------------------------------------------------------------------------
    /// A job was registered with the engine.
    JobSubmitted { job_id: JobId, name: String },

    /// A job's driver started an activation.
    JobStarted { job_id: JobId, activation: u64 },

    /// A job's production step returned; all of its tasks are submitted.
    AllTasksSubmitted { job_id: JobId, tasks_spawned: u64 },

    /// A job activation finished (completion hook included).
    JobCompleted {
        job_id: JobId,
        duration: Duration,
        tasks_spawned: u64,
    },

    /// A completed job was reset for a fresh activation.
    JobRestarted { job_id: JobId },

    // -------------------------------------------------------------------------
    // Task Lifecycle Events
    // -------------------------------------------------------------------------
    /// A task was enqueued for execution.
    TaskEnqueued {
        job_id: JobId,
        task_name: String,
        queue_depth: usize,
    },

    /// A task started executing on a worker.
    TaskStarted { job_id: JobId, task_name: String },

    /// A task finished executing.
    TaskCompleted {
        job_id: JobId,
        task_name: String,
        result: TaskResultKind,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Shutdown Events
    // -------------------------------------------------------------------------
    /// Queued tasks were discarded by the shutdown drain.
    TasksDiscarded { count: usize },

    /// Shutdown finished; every worker thread has been joined.
    ShutdownComplete { workers_joined: usize },
}

impl TelemetryEvent {
    /// Returns the job ID associated with this event, if any.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::JobSubmitted { job_id, .. }
            | Self::JobStarted { job_id, .. }
            | Self::AllTasksSubmitted { job_id, .. }
            | Self::JobCompleted { job_id, .. }
            | Self::JobRestarted { job_id }
            | Self::TaskEnqueued { job_id, .. }
            | Self::TaskStarted { job_id, .. }
            | Self::TaskCompleted { job_id, .. } => Some(job_id),
            Self::TasksDiscarded { .. } | Self::ShutdownComplete { .. } => None,
        }
    }

    /// Returns a short name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::JobSubmitted { .. } => "job_submitted",
            Self::JobStarted { .. } => "job_started",
            Self::AllTasksSubmitted { .. } => "all_tasks_submitted",
            Self::JobCompleted { .. } => "job_completed",
            Self::JobRestarted { .. } => "job_restarted",
            Self::TaskEnqueued { .. } => "task_enqueued",
            Self::TaskStarted { .. } => "task_started",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TasksDiscarded { .. } => "tasks_discarded",
            Self::ShutdownComplete { .. } => "shutdown_complete",
        }
    }
}

// =============================================================================
// Telemetry Sink Trait
// =============================================================================

/// Sink for telemetry events.
///
/// Implement this trait to receive telemetry events from the engine.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`): events are emitted
/// concurrently from worker and driver threads. The `emit` method should be
/// fast and non-blocking.
pub trait TelemetrySink: Send + Sync {
    /// Called when a telemetry event occurs.
    fn emit(&self, event: TelemetryEvent);
}

// =============================================================================
// Built-in Sink Implementations
// =============================================================================

/// No-op sink for when telemetry is disabled.
///
/// This is useful for testing or when telemetry overhead is not desired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn emit(&self, _event: TelemetryEvent) {
        // Intentionally empty
    }
}

/// Sink that logs events using the `tracing` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        match &event {
            TelemetryEvent::JobSubmitted { job_id, name } => {
                tracing::debug!(job_id = %job_id, name = %name, "Job submitted");
            }
            TelemetryEvent::JobStarted { job_id, activation } => {
                tracing::debug!(job_id = %job_id, activation, "Job started");
            }
            TelemetryEvent::AllTasksSubmitted {
                job_id,
                tasks_spawned,
            } => {
                tracing::debug!(
                    job_id = %job_id,
                    tasks_spawned,
                    "All tasks submitted"
                );
            }
            TelemetryEvent::JobCompleted {
                job_id,
                duration,
                tasks_spawned,
            } => {
                tracing::debug!(
                    job_id = %job_id,
                    duration_ms = duration.as_millis() as u64,
                    tasks_spawned,
                    "Job completed"
                );
            }
            TelemetryEvent::JobRestarted { job_id } => {
                tracing::debug!(job_id = %job_id, "Job restarted");
            }
            TelemetryEvent::TaskEnqueued {
                job_id,
                task_name,
                queue_depth,
            } => {
                tracing::trace!(
                    job_id = %job_id,
                    task = %task_name,
                    queue_depth,
                    "Task enqueued"
                );
            }
            TelemetryEvent::TaskStarted { job_id, task_name } => {
                tracing::trace!(job_id = %job_id, task = %task_name, "Task started");
            }
            TelemetryEvent::TaskCompleted {
                job_id,
                task_name,
                result,
                duration,
            } => {
                tracing::trace!(
                    job_id = %job_id,
                    task = %task_name,
                    result = %result,
                    duration_us = duration.as_micros() as u64,
                    "Task completed"
                );
            }
            TelemetryEvent::TasksDiscarded { count } => {
                tracing::warn!(count, "Discarded queued tasks at shutdown");
            }
            TelemetryEvent::ShutdownComplete { workers_joined } => {
                tracing::info!(workers_joined, "Engine shutdown complete");
            }
        }
    }
}
