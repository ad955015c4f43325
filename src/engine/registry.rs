//! Job registry: uniqueness-checked store of registered jobs.
//!
//! The registry owns every registered job for the lifetime of its
//! registration, enforcing at-most-one live registration per [`JobId`] and
//! supporting atomic extraction. Lookups are lock-free on the hot path.

use super::handle::{JobHandle, JobStatus};
use super::job::{Job, JobId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entry for a registered job.
///
/// Cheap to clone: the job is shared (`Arc`) and the handle is itself a
/// shared reference to the job's lifecycle state.
#[derive(Clone)]
pub(crate) struct JobEntry {
    /// The registered job.
    pub job: Arc<dyn Job>,

    /// Handle over the job's lifecycle state.
    pub handle: JobHandle,

    /// When the job was first registered.
    pub submitted_at: Instant,
}

impl JobEntry {
    /// Creates a new registry entry.
    pub(crate) fn new(job: Arc<dyn Job>, handle: JobHandle) -> Self {
        Self {
            job,
            handle,
            submitted_at: Instant::now(),
        }
    }
}

impl std::fmt::Debug for JobEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobEntry")
            .field("job_id", self.handle.id())
            .field("name", &self.job.name())
            .field("status", &self.handle.status())
            .finish_non_exhaustive()
    }
}

/// Registry of all currently registered jobs.
///
/// Registration, lookup, and extraction use a concurrent map; lifetime
/// statistics are tracked with atomic counters.
pub(crate) struct JobRegistry {
    /// Registered jobs indexed by id.
    jobs: DashMap<JobId, JobEntry>,

    /// Jobs registered over the registry's lifetime.
    total_registered: AtomicU64,

    /// Jobs extracted over the registry's lifetime.
    total_extracted: AtomicU64,
}

impl JobRegistry {
    /// Creates a new empty registry.
    pub(crate) fn new() -> Self {
        Self {
            jobs: DashMap::new(),
            total_registered: AtomicU64::new(0),
            total_extracted: AtomicU64::new(0),
        }
    }

    /// Inserts an entry if its id is not already registered.
    ///
    /// On duplicate, the entry is handed back unregistered and the registry
    /// is unchanged.
    pub(crate) fn try_insert(&self, entry: JobEntry) -> Result<(), JobEntry> {
        match self.jobs.entry(entry.handle.id().clone()) {
            Entry::Occupied(_) => Err(entry),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                self.total_registered.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }
    }

    /// Looks up a job by id, returning a clone of its entry.
    pub(crate) fn get(&self, id: &JobId) -> Option<JobEntry> {
        self.jobs.get(id).map(|entry| entry.value().clone())
    }

    /// Atomically removes and returns the entry for the given id.
    pub(crate) fn extract(&self, id: &JobId) -> Option<JobEntry> {
        let (_, entry) = self.jobs.remove(id)?;
        self.total_extracted.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            job_id = %id,
            elapsed_ms = entry.submitted_at.elapsed().as_millis(),
            "Job extracted from registry"
        );

        Some(entry)
    }

    /// Returns the number of currently registered jobs.
    pub(crate) fn active_count(&self) -> usize {
        self.jobs.len()
    }

    /// Returns registered jobs whose current activation has run longer than
    /// the threshold without reaching done.
    ///
    /// Used by the stall watchdog to surface stuck jobs.
    pub(crate) fn find_stalled(&self, threshold: Duration) -> Vec<JobEntry> {
        self.jobs
            .iter()
            .filter(|entry| {
                let handle = &entry.value().handle;
                !handle.is_done() && handle.activation_elapsed() > threshold
            })
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns a snapshot of registry statistics.
    pub(crate) fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            active_jobs: self.jobs.len(),
            total_registered: self.total_registered.load(Ordering::Relaxed),
            total_extracted: self.total_extracted.load(Ordering::Relaxed),
            ..Default::default()
        };

        for entry in self.jobs.iter() {
            match entry.value().handle.status() {
                JobStatus::Pending => stats.jobs_pending += 1,
                JobStatus::Producing => stats.jobs_producing += 1,
                JobStatus::AwaitingTasks => stats.jobs_awaiting_tasks += 1,
                JobStatus::Completing => stats.jobs_completing += 1,
                JobStatus::Done => stats.jobs_done += 1,
            }
        }

        stats
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of registry statistics.
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    /// Currently registered jobs.
    pub active_jobs: usize,
    /// Jobs registered (lifetime).
    pub total_registered: u64,
    /// Jobs extracted (lifetime).
    pub total_extracted: u64,
    /// Registered jobs in `Pending`.
    pub jobs_pending: usize,
    /// Registered jobs in `Producing`.
    pub jobs_producing: usize,
    /// Registered jobs in `AwaitingTasks`.
    pub jobs_awaiting_tasks: usize,
    /// Registered jobs in `Completing`.
    pub jobs_completing: usize,
    /// Registered jobs in `Done`.
    pub jobs_done: usize,
}
