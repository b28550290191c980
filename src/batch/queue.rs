//! Shared job queue.
//!
//! Populated once by the coordinator before any consumer starts, then drained
//! concurrently by the per-worker feeder threads. `try_take` removes the job,
//! so every job is claimed at most once; a job claimed by a worker that later
//! fails is lost, never re-enqueued.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

/// One unit of work: a single preset file to render across the pitch range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub preset_path: PathBuf,
}

/// Concurrent FIFO of pending jobs.
pub struct TaskQueue {
    jobs: Mutex<VecDeque<JobDescriptor>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
        }
    }

    /// Non-blocking insert. Only called during the single producer phase.
    pub fn put(&self, job: JobDescriptor) {
        self.jobs
            .lock()
            .expect("task queue mutex poisoned")
            .push_back(job);
    }

    /// Claim the next job, or `None` if the queue is empty. Never blocks
    /// beyond the queue's own critical section.
    pub fn try_take(&self) -> Option<JobDescriptor> {
        self.jobs
            .lock()
            .expect("task queue mutex poisoned")
            .pop_front()
    }

    /// Number of unclaimed jobs. Advisory: the value can be stale by the time
    /// the caller looks at it.
    pub fn remaining(&self) -> usize {
        self.jobs.lock().expect("task queue mutex poisoned").len()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
