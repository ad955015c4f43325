//! Bounded task queue feeding the worker pool.
//!
//! A thread-safe FIFO shared by every producer (job drivers pushing during
//! production) and every consumer (worker threads). With a nonzero capacity,
//! `push` blocks while the queue is full (backpressure); `pop` blocks while
//! the queue is empty. Both are condvar waits, never spin loops.
//!
//! Ordering is FIFO across all producers combined; there is no per-job
//! ordering guarantee beyond relative arrival order.

use super::handle::JobHandle;
use super::task::Task;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// A task tagged with the handle of its owning job.
pub(crate) struct QueuedTask {
    /// Handle of the owning job, used to decrement its outstanding count.
    pub handle: JobHandle,

    /// The task to execute.
    pub task: Box<dyn Task>,
}

impl std::fmt::Debug for QueuedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedTask")
            .field("job_id", self.handle.id())
            .field("task", &self.task.name())
            .finish()
    }
}

/// Outcome of a blocking pop.
pub(crate) enum Popped {
    /// The next task in FIFO order.
    Task(QueuedTask),

    /// Shutdown was observed; the worker should exit.
    Shutdown,
}

/// Queue state guarded by the mutex.
struct QueueInner {
    items: VecDeque<QueuedTask>,
    shutting_down: bool,
}

/// Bounded, thread-safe FIFO of pending tasks.
pub(crate) struct TaskQueue {
    inner: Mutex<QueueInner>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl TaskQueue {
    /// Creates a queue with the given capacity (`0` = unbounded).
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::new(),
                shutting_down: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Appends a task, blocking while the queue is at capacity.
    ///
    /// The owning job's outstanding count is incremented under the queue
    /// lock, before the task becomes poppable, so a worker can never
    /// decrement it first. Returns the queue depth after the push.
    ///
    /// # Errors
    ///
    /// Returns the task back once shutdown has begun; the counter is not
    /// incremented in that case.
    pub(crate) fn push(&self, queued: QueuedTask) -> Result<usize, QueuedTask> {
        let mut inner = self.inner.lock().unwrap();

        loop {
            if inner.shutting_down {
                return Err(queued);
            }
            if self.capacity == 0 || inner.items.len() < self.capacity {
                break;
            }
            inner = self.not_full.wait(inner).unwrap();
        }

        queued.handle.task_spawned();
        inner.items.push_back(queued);
        let depth = inner.items.len();
        drop(inner);

        self.not_empty.notify_one();
        Ok(depth)
    }

    /// Removes the next task in FIFO order, blocking while the queue is
    /// empty, until a task arrives or shutdown is observed.
    pub(crate) fn pop(&self) -> Popped {
        let mut inner = self.inner.lock().unwrap();

        loop {
            if let Some(queued) = inner.items.pop_front() {
                drop(inner);
                self.not_full.notify_one();
                return Popped::Task(queued);
            }
            if inner.shutting_down {
                return Popped::Shutdown;
            }
            inner = self.not_empty.wait(inner).unwrap();
        }
    }

    /// Begins shutdown: drains all pending tasks and wakes every blocked
    /// pusher and popper.
    ///
    /// The drained tasks are returned so the caller can settle their jobs'
    /// outstanding counts. Idempotent; a second call drains nothing.
    pub(crate) fn shutdown(&self) -> Vec<QueuedTask> {
        let mut inner = self.inner.lock().unwrap();
        inner.shutting_down = true;
        let drained: Vec<QueuedTask> = inner.items.drain(..).collect();
        drop(inner);

        self.not_empty.notify_all();
        self.not_full.notify_all();
        drained
    }

    /// Returns the number of tasks currently queued.
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    /// Returns the configured capacity (`0` = unbounded).
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}
