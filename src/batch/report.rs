//! Batch outcome reporting.
//!
//! Failures are collected only after the whole pool has joined; nothing is
//! streamed mid-run. A failed worker never stops its siblings, but the batch
//! outcome must still say that something was lost.

use super::worker::{WorkerResult, WorkerTrace};

/// One failed worker, in pool index order.
#[derive(Debug, Clone)]
pub struct WorkerFailure {
    pub worker_index: usize,
    pub trace: WorkerTrace,
}

/// Final status of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every worker drained to the empty queue and exited cleanly.
    Completed,
    /// The run finished, but at least one worker failed; some presets may
    /// have produced no output files.
    CompletedWithFailures,
}

/// Aggregated results of one batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub total_jobs: usize,
    pub worker_count: usize,
    pub failures: Vec<WorkerFailure>,
}

impl BatchReport {
    /// Collect worker results in index order.
    pub fn from_results(total_jobs: usize, results: Vec<WorkerResult>) -> Self {
        let worker_count = results.len();
        let failures = results
            .into_iter()
            .enumerate()
            .filter_map(|(worker_index, result)| match result {
                WorkerResult::Success => None,
                WorkerResult::Failed(trace) => Some(WorkerFailure {
                    worker_index,
                    trace,
                }),
            })
            .collect();

        Self {
            total_jobs,
            worker_count,
            failures,
        }
    }

    pub fn outcome(&self) -> BatchOutcome {
        if self.failures.is_empty() {
            BatchOutcome::Completed
        } else {
            BatchOutcome::CompletedWithFailures
        }
    }

    /// Emit the combined report, once, after the pool has fully joined.
    pub fn emit(&self) {
        for failure in &self.failures {
            tracing::error!(
                worker_index = failure.worker_index,
                trace = %failure.trace,
                "worker failed"
            );
        }

        match self.outcome() {
            BatchOutcome::Completed => {
                tracing::info!(
                    jobs = self.total_jobs,
                    workers = self.worker_count,
                    "batch complete"
                );
            }
            BatchOutcome::CompletedWithFailures => {
                tracing::warn!(
                    jobs = self.total_jobs,
                    workers = self.worker_count,
                    failed_workers = self.failures.len(),
                    "batch completed with failures; some presets may have no output"
                );
            }
        }
    }
}
