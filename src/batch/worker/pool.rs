//! Worker pool.
//!
//! Launches a fixed number of worker subprocesses and one feeder thread per
//! worker. Each feeder claims jobs from the shared queue on its worker's
//! behalf and forwards them one at a time over the worker's pipe, so a job is
//! claimed at most once and a worker never holds more than one job.

#![allow(dead_code)] // Some fields/methods are for monitoring

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::batch::RenderSettings;
use crate::batch::queue::TaskQueue;
use crate::error::{Result, WavefarmError};

use super::proc::Proc;
use super::protocol::{WorkRequest, WorkResponse};
use super::signals::{TerminationReason, WorkerTrace, analyze_wait_status};
use super::spawn::spawn_worker;

/// How long a worker gets to exit after being asked to.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait for a worker's exit status after its pipe closed
/// unexpectedly.
const DEATH_REAP_TIMEOUT: Duration = Duration::from_secs(2);

/// Terminal outcome of one worker's entire run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerResult {
    /// The worker drained the queue to empty and exited cleanly.
    Success,
    /// The worker hit a fatal fault and stopped claiming work.
    Failed(WorkerTrace),
}

impl WorkerResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Handle to one worker, resolving to its [`WorkerResult`].
pub struct WorkerHandle {
    id: usize,
    thread: JoinHandle<WorkerResult>,
}

impl WorkerHandle {
    /// Worker index within the pool.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Whether this worker's result is ready.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

/// A fixed-size pool of worker subprocesses draining one shared queue.
pub struct WorkerPool {
    handles: Vec<WorkerHandle>,
}

impl WorkerPool {
    /// Spawn `worker_count` workers against `queue`.
    ///
    /// Every subprocess is spawned before any feeder starts, so the workers
    /// begin together. If a spawn fails partway, the already-started children
    /// are stopped before the error returns.
    pub fn launch(
        queue: Arc<TaskQueue>,
        settings: &RenderSettings,
        worker_count: usize,
        log_level: &str,
    ) -> Result<Self> {
        if worker_count == 0 {
            return Err(WavefarmError::InvalidConfig(
                "worker count must be at least 1".into(),
            ));
        }

        tracing::info!(workers = worker_count, "launching worker pool");

        let mut procs = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            match spawn_worker(id, settings, log_level) {
                Ok(proc) => procs.push(proc),
                Err(e) => {
                    for mut proc in procs {
                        let _ = proc.stop(SHUTDOWN_TIMEOUT);
                    }
                    return Err(e);
                }
            }
        }

        let mut handles: Vec<WorkerHandle> = Vec::with_capacity(worker_count);
        for (id, proc) in procs.into_iter().enumerate() {
            let queue = Arc::clone(&queue);
            let spawned = thread::Builder::new()
                .name(format!("feeder-{}", id))
                .spawn(move || drive_worker(id, proc, queue));

            match spawned {
                Ok(thread) => handles.push(WorkerHandle { id, thread }),
                Err(e) => {
                    // Feeders already running will drain and stop their own
                    // workers; remaining Procs are killed as they drop.
                    for handle in handles {
                        let _ = handle.thread.join();
                    }
                    return Err(WavefarmError::Worker(format!(
                        "failed to start feeder thread {}: {}",
                        id, e
                    )));
                }
            }
        }

        Ok(Self { handles })
    }

    /// Number of workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Whether every worker handle has resolved.
    pub fn all_finished(&self) -> bool {
        self.handles.iter().all(WorkerHandle::is_finished)
    }

    /// Join all workers and return their results in worker-index order.
    pub fn join(mut self) -> Vec<WorkerResult> {
        self.handles
            .drain(..)
            .map(|handle| {
                let id = handle.id;
                handle.thread.join().unwrap_or_else(|_| {
                    WorkerResult::Failed(WorkerTrace::new(
                        "feeder thread panicked",
                        format!("driving worker {}", id),
                    ))
                })
            })
            .collect()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Joining here keeps every subprocess accounted for on early-exit
        // paths; feeders stop their own children.
        for handle in self.handles.drain(..) {
            let _ = handle.thread.join();
        }
    }
}

/// Feeder loop: claim jobs for one worker until the queue is empty or the
/// worker fails. Produces exactly one [`WorkerResult`].
fn drive_worker(id: usize, mut proc: Proc, queue: Arc<TaskQueue>) -> WorkerResult {
    // Initialization barrier: the child signals Ready once its engine is up
    match proc.recv() {
        Ok(Some(WorkResponse::Ready)) => {}
        Ok(Some(other)) => {
            let _ = proc.stop(SHUTDOWN_TIMEOUT);
            return WorkerResult::Failed(WorkerTrace::new(
                format!("unexpected response during startup: {:?}", other),
                "initializing engine",
            ));
        }
        Ok(None) => {
            return WorkerResult::Failed(death_trace(&mut proc, "initializing engine"));
        }
        Err(e) => {
            let _ = proc.stop(SHUTDOWN_TIMEOUT);
            return WorkerResult::Failed(WorkerTrace::new(e.to_string(), "initializing engine"));
        }
    }

    while let Some(job) = queue.try_take() {
        let context = format!("processing {}", job.preset_path.display());

        if let Err(e) = proc.send(&WorkRequest::Render {
            preset_path: job.preset_path.clone(),
        }) {
            let _ = proc.stop(SHUTDOWN_TIMEOUT);
            return WorkerResult::Failed(WorkerTrace::new(e.to_string(), context));
        }

        match proc.recv() {
            Ok(Some(WorkResponse::Done { files_written })) => {
                tracing::debug!(
                    worker_id = id,
                    files_written,
                    preset = %job.preset_path.display(),
                    "job complete"
                );
            }
            Ok(Some(WorkResponse::Error { message, context })) => {
                // In-band fatal fault; the worker is already exiting
                let _ = proc.stop(SHUTDOWN_TIMEOUT);
                return WorkerResult::Failed(WorkerTrace::new(message, context));
            }
            Ok(Some(WorkResponse::Ready)) => {
                let _ = proc.stop(SHUTDOWN_TIMEOUT);
                return WorkerResult::Failed(WorkerTrace::new(
                    "unexpected ready response mid-job",
                    context,
                ));
            }
            Ok(None) => {
                return WorkerResult::Failed(death_trace(&mut proc, &context));
            }
            Err(e) => {
                let _ = proc.stop(SHUTDOWN_TIMEOUT);
                return WorkerResult::Failed(WorkerTrace::new(e.to_string(), context));
            }
        }
    }

    // Queue exhausted: the only success path
    if let Err(e) = proc.stop(SHUTDOWN_TIMEOUT) {
        tracing::warn!(worker_id = id, error = %e, "worker did not shut down cleanly");
    }
    tracing::debug!(worker_id = id, "worker finished");
    WorkerResult::Success
}

/// Build a failure trace for a worker whose pipe closed without an in-band
/// error, waiting briefly for its exit status.
fn death_trace(proc: &mut Proc, context: &str) -> WorkerTrace {
    let reason = match proc.wait_timeout(DEATH_REAP_TIMEOUT) {
        Some(status) => analyze_wait_status(status),
        None => {
            // Pipe closed but the process lingers; put it down
            let _ = proc.kill();
            TerminationReason::Unknown
        }
    };
    WorkerTrace::from_termination(&reason, context)
}
