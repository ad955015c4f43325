//! Stall detection watchdog.
//!
//! Monitors the job registry and warns when a job's activation has been
//! running beyond a threshold without reaching done. A stuck outstanding
//! count is the primary symptom of a client task that never finishes, so
//! the watchdog surfaces it instead of leaving waiters hanging silently.

use super::core::EngineShared;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default stall detection threshold (30 seconds).
pub const STALL_DETECTION_THRESHOLD_SECS: u64 = 30;

/// Default watchdog check interval (10 seconds).
pub const STALL_WATCHDOG_INTERVAL_SECS: u64 = 10;

/// Stop signal shared with the watchdog thread.
struct StopSignal {
    stopped: Mutex<bool>,
    cond: Condvar,
}

/// Background thread that periodically checks for stalled jobs.
pub(crate) struct StallWatchdog {
    stop: Arc<StopSignal>,
    thread: Option<JoinHandle<()>>,
}

impl StallWatchdog {
    /// Spawns the watchdog thread for the given engine.
    pub(crate) fn spawn(shared: Arc<EngineShared>) -> Self {
        let stop = Arc::new(StopSignal {
            stopped: Mutex::new(false),
            cond: Condvar::new(),
        });

        let stop_for_thread = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("conveyor-watchdog".to_string())
            .spawn(move || Self::run(shared, stop_for_thread))
            .expect("Failed to spawn watchdog thread");

        Self {
            stop,
            thread: Some(thread),
        }
    }

    /// Watchdog thread body: check between condvar-timed sleeps until
    /// stopped.
    fn run(shared: Arc<EngineShared>, stop: Arc<StopSignal>) {
        let interval = Duration::from_secs(STALL_WATCHDOG_INTERVAL_SECS);
        let threshold = Duration::from_secs(STALL_DETECTION_THRESHOLD_SECS);

        loop {
            {
                let guard = stop.stopped.lock().unwrap();
                if *guard {
                    break;
                }
                let (guard, _timeout) = stop.cond.wait_timeout(guard, interval).unwrap();
                if *guard {
                    break;
                }
            }

            Self::check_health(&shared, threshold);
        }

        tracing::debug!("Watchdog exiting");
    }

    /// Logs any jobs whose activation exceeds the stall threshold.
    fn check_health(shared: &EngineShared, threshold: Duration) {
        let stalled = shared.registry.find_stalled(threshold);

        if stalled.is_empty() {
            tracing::debug!(
                active_jobs = shared.registry.active_count(),
                queued_tasks = shared.queue.len(),
                "Stall watchdog: engine healthy"
            );
            return;
        }

        for entry in stalled {
            tracing::warn!(
                job_id = %entry.handle.id(),
                status = %entry.handle.status(),
                outstanding = entry.handle.outstanding_tasks(),
                elapsed_secs = entry.handle.activation_elapsed().as_secs(),
                "STALL DETECTED: job has made no progress past the threshold"
            );
        }
    }

    /// Stops the watchdog and joins its thread.
    pub(crate) fn stop(mut self) {
        *self.stop.stopped.lock().unwrap() = true;
        self.stop.cond.notify_all();

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
