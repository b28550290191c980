//! Process handle for worker subprocesses.
//!
//! Wraps a child process with its IPC channels and the wait/terminate
//! plumbing around it.

#![allow(dead_code)] // Some methods are for monitoring

use std::os::fd::OwnedFd;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

use crate::error::{Result, WavefarmError};

use super::ipc::{MessageReader, MessageWriter, PipeFd};
use super::protocol::{WorkRequest, WorkResponse};

/// Handle to a worker subprocess with IPC channels.
pub struct Proc {
    pid: Pid,
    writer: MessageWriter,
    reader: MessageReader,
    /// Whether the process has been reaped.
    reaped: bool,
}

impl Proc {
    /// Create from a spawned `std::process::Child`, taking ownership of its
    /// stdin and stdout pipes.
    pub fn from_child(mut child: std::process::Child) -> Result<Self> {
        let pid = Pid::from_raw(child.id() as i32);

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| WavefarmError::Worker("child stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WavefarmError::Worker("child stdout not captured".into()))?;

        Ok(Self {
            pid,
            writer: MessageWriter::new(PipeFd::new(OwnedFd::from(stdin))),
            reader: MessageReader::new(PipeFd::new(OwnedFd::from(stdout))),
            reaped: false,
        })
    }

    /// Get the process ID.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Send a request to the worker.
    pub fn send(&mut self, request: &WorkRequest) -> Result<()> {
        self.writer
            .send(request)
            .map_err(|e| WavefarmError::Worker(format!("failed to send to worker: {}", e)))
    }

    /// Receive a response from the worker.
    ///
    /// Returns `None` if the worker closed its stdout (EOF).
    pub fn recv(&mut self) -> Result<Option<WorkResponse>> {
        self.reader
            .recv()
            .map_err(|e| WavefarmError::Worker(format!("failed to receive from worker: {}", e)))
    }

    /// Try to wait for the process (non-blocking).
    ///
    /// Returns `None` if the process is still running.
    pub fn try_wait(&mut self) -> Result<Option<WaitStatus>> {
        if self.reaped {
            return Err(WavefarmError::Worker("process already reaped".into()));
        }
        match waitpid(self.pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => Ok(None),
            Ok(status) => {
                self.reaped = true;
                Ok(Some(status))
            }
            Err(e) => Err(WavefarmError::Worker(format!("waitpid failed: {}", e))),
        }
    }

    /// Poll for process exit for up to `timeout`.
    ///
    /// Returns the wait status if the process exited within the window.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<WaitStatus> {
        let start = std::time::Instant::now();
        loop {
            match self.try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) => {}
                Err(_) => return None,
            }
            if start.elapsed() >= timeout {
                return None;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Send SIGTERM to the process.
    pub fn terminate(&self) -> Result<()> {
        if self.reaped {
            return Ok(());
        }
        signal::kill(self.pid, Signal::SIGTERM)
            .map_err(|e| WavefarmError::Worker(format!("failed to send SIGTERM: {}", e)))
    }

    /// Send SIGKILL to the process and reap it.
    pub fn kill(&mut self) -> Result<()> {
        if self.reaped {
            return Ok(());
        }
        signal::kill(self.pid, Signal::SIGKILL)
            .map_err(|e| WavefarmError::Worker(format!("failed to send SIGKILL: {}", e)))?;
        match waitpid(self.pid, None) {
            Ok(_) => {
                self.reaped = true;
                Ok(())
            }
            Err(e) => Err(WavefarmError::Worker(format!("waitpid failed: {}", e))),
        }
    }

    /// Gracefully stop the worker: send the exit command, wait briefly, then
    /// escalate to SIGTERM and finally SIGKILL.
    pub fn stop(&mut self, timeout: Duration) -> Result<()> {
        if self.reaped {
            return Ok(());
        }

        // The pipe may already be closed if the worker exited on its own
        let _ = self.send(&WorkRequest::Exit);

        if self.wait_timeout(timeout).is_some() {
            return Ok(());
        }

        let _ = self.terminate();
        if self.wait_timeout(Duration::from_millis(100)).is_some() {
            return Ok(());
        }

        self.kill()
    }
}

impl Drop for Proc {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.terminate();
            if self.wait_timeout(Duration::from_millis(50)).is_some() {
                return;
            }
            let _ = signal::kill(self.pid, Signal::SIGKILL);
            let _ = waitpid(self.pid, None);
            self.reaped = true;
        }
    }
}
