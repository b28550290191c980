//! Worker subprocess pool for parallel preset rendering.
//!
//! Each worker is an independent OS process owning its own synthesis engine;
//! the coordinator brokers the shared job queue to them over pipes.
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │   Coordinator    │
//!                  │  (TaskQueue)     │
//!                  └────────┬─────────┘
//!                           │ one feeder thread per worker
//!            ┌──────────────┼──────────────┐
//!            │              │              │
//!      ┌─────▼─────┐  ┌─────▼─────┐  ┌─────▼─────┐
//!      │ Worker 0  │  │ Worker 1  │  │ Worker N  │
//!      │ (process) │  │ (process) │  │ (process) │
//!      │ SynthEng  │  │ SynthEng  │  │ SynthEng  │
//!      └───────────┘  └───────────┘  └───────────┘
//! ```
//!
//! # Failure model
//!
//! - A fault inside a worker ends that worker only; its result records the
//!   trace and the siblings keep draining the queue.
//! - A job in flight when its worker fails is lost, never redelivered.
//! - Workers never talk to each other; the queue is the only shared state.

mod ipc;
mod pool;
mod proc;
mod protocol;
mod signals;
mod spawn;
pub mod worker_main;

pub use pool::{WorkerPool, WorkerResult};
pub use signals::WorkerTrace;
pub use worker_main::run_worker_main;

// Re-export for potential external use
#[allow(unused_imports)]
pub use protocol::{WorkRequest, WorkResponse};
