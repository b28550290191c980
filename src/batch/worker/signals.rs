//! Crash analysis for worker subprocesses.
//!
//! When a worker dies without reporting an in-band error, the wait status is
//! the only evidence of what happened.

#![allow(dead_code)] // Some helpers are for diagnostics

use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;

/// Reason why a worker process terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// Normal exit with status code.
    Exited(i32),
    /// Killed by signal.
    Signaled(Signal),
    /// Likely out of memory (SIGKILL from OOM killer).
    OutOfMemory,
    /// Process is still running.
    StillAlive,
    /// Unknown termination reason.
    Unknown,
}

impl TerminationReason {
    /// Check if this is a successful exit.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }

    /// Get a human-readable description.
    pub fn description(&self) -> String {
        match self {
            Self::Exited(code) => format!("exited with code {}", code),
            Self::Signaled(sig) => format!("killed by signal {:?}", sig),
            Self::OutOfMemory => "out of memory (SIGKILL from OOM killer)".to_string(),
            Self::StillAlive => "still running".to_string(),
            Self::Unknown => "unknown reason".to_string(),
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Analyze a `WaitStatus` to determine the termination reason.
pub fn analyze_wait_status(status: WaitStatus) -> TerminationReason {
    match status {
        WaitStatus::Exited(_, code) => TerminationReason::Exited(code),

        WaitStatus::Signaled(_, signal, _) => match signal {
            // SIGKILL without our involvement is almost always the OOM killer
            Signal::SIGKILL => TerminationReason::OutOfMemory,
            _ => TerminationReason::Signaled(signal),
        },

        WaitStatus::StillAlive => TerminationReason::StillAlive,

        _ => TerminationReason::Unknown,
    }
}

/// Captured failure context for a worker that terminated fatally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerTrace {
    /// What went wrong.
    pub message: String,
    /// What the worker was doing when it failed.
    pub context: String,
}

impl WorkerTrace {
    pub fn new(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Build a trace from an out-of-band termination.
    pub fn from_termination(reason: &TerminationReason, context: impl Into<String>) -> Self {
        Self {
            message: format!("worker {}", reason),
            context: context.into(),
        }
    }
}

impl std::fmt::Display for WorkerTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (while {})", self.message, self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::Pid;

    #[test]
    fn test_termination_reason_success() {
        assert!(TerminationReason::Exited(0).is_success());
        assert!(!TerminationReason::Exited(1).is_success());
        assert!(!TerminationReason::OutOfMemory.is_success());
    }

    #[test]
    fn test_analyze_wait_status() {
        let status = WaitStatus::Exited(Pid::from_raw(1), 0);
        assert_eq!(analyze_wait_status(status), TerminationReason::Exited(0));

        let status = WaitStatus::Signaled(Pid::from_raw(1), Signal::SIGKILL, false);
        assert_eq!(analyze_wait_status(status), TerminationReason::OutOfMemory);

        let status = WaitStatus::Signaled(Pid::from_raw(1), Signal::SIGSEGV, false);
        assert_eq!(
            analyze_wait_status(status),
            TerminationReason::Signaled(Signal::SIGSEGV)
        );

        assert_eq!(
            analyze_wait_status(WaitStatus::StillAlive),
            TerminationReason::StillAlive
        );
    }

    #[test]
    fn test_worker_trace_display() {
        let trace = WorkerTrace::new("preset failed to load", "processing /p/bad.preset");
        let display = trace.to_string();
        assert!(display.contains("preset failed to load"));
        assert!(display.contains("/p/bad.preset"));
    }

    #[test]
    fn test_trace_from_termination() {
        let trace =
            WorkerTrace::from_termination(&TerminationReason::OutOfMemory, "rendering pitch 72");
        assert!(trace.message.contains("out of memory"));
        assert_eq!(trace.context, "rendering pitch 72");
    }
}
