//! Engine configuration.
//!
//! This module contains the [`EngineConfig`] struct and related constants
//! for configuring the conveyor engine.

// =============================================================================
// Configuration Constants
// =============================================================================

/// Default worker thread count (0 = derive from available parallelism).
pub const DEFAULT_WORKER_THREADS: usize = 0;

/// Default task queue capacity (0 = unbounded).
pub const DEFAULT_QUEUE_CAPACITY: usize = 0;

/// Parallelism assumed when the platform cannot report it.
const FALLBACK_PARALLELISM: usize = 2;

// =============================================================================
// Engine Configuration
// =============================================================================

/// Configuration for the conveyor engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Number of worker threads.
    ///
    /// `0` derives the count from the host: available parallelism minus one
    /// (leaving a core for the submitting thread), with a minimum of one.
    pub worker_threads: usize,

    /// Task queue capacity.
    ///
    /// With a nonzero capacity, task submission blocks while the queue is
    /// full until a worker frees a slot. `0` means unbounded.
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Set the number of worker threads (0 = auto).
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Set the task queue capacity (0 = unbounded).
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Returns the effective worker thread count.
    ///
    /// Resolves `0` to available parallelism minus one, minimum one.
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads != 0 {
            return self.worker_threads;
        }

        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(FALLBACK_PARALLELISM);

        parallelism.saturating_sub(1).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.worker_threads, DEFAULT_WORKER_THREADS);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_engine_config_builders() {
        let config = EngineConfig::default()
            .with_worker_threads(3)
            .with_queue_capacity(64);

        assert_eq!(config.worker_threads, 3);
        assert_eq!(config.queue_capacity, 64);
    }

    #[test]
    fn test_resolved_worker_threads_explicit() {
        let config = EngineConfig::default().with_worker_threads(7);
        assert_eq!(config.resolved_worker_threads(), 7);
    }

    #[test]
    fn test_resolved_worker_threads_auto_is_at_least_one() {
        let config = EngineConfig::default();
        assert!(config.resolved_worker_threads() >= 1);
    }

    #[test]
    fn test_engine_config_clone() {
        let config = EngineConfig::default().with_queue_capacity(8);
        let cloned = config.clone();
        assert_eq!(cloned.queue_capacity, config.queue_capacity);
    }
}
