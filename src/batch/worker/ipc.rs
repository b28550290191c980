//! Pipe IPC primitives for worker subprocesses.
//!
//! Messages travel as newline-delimited JSON over the child's stdin/stdout.
//! Reads and writes retry on EINTR.

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A file descriptor wrapper that implements Read/Write with EINTR handling.
pub struct PipeFd {
    fd: OwnedFd,
}

impl PipeFd {
    /// Create from an owned file descriptor.
    pub fn new(fd: OwnedFd) -> Self {
        Self { fd }
    }

    /// Create from a raw file descriptor (takes ownership).
    ///
    /// # Safety
    /// The caller must ensure `fd` is a valid file descriptor that can be owned.
    pub unsafe fn from_raw(fd: RawFd) -> Self {
        Self {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        }
    }
}

impl AsFd for PipeFd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for PipeFd {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl Read for PipeFd {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match nix::unistd::read(self.fd.as_raw_fd(), buf) {
                Ok(n) => return Ok(n),
                Err(nix::errno::Errno::EINTR) => continue,
                Err(e) => return Err(io::Error::from_raw_os_error(e as i32)),
            }
        }
    }
}

impl Write for PipeFd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            match nix::unistd::write(&self.fd, buf) {
                Ok(n) => return Ok(n),
                Err(nix::errno::Errno::EINTR) => continue,
                Err(e) => return Err(io::Error::from_raw_os_error(e as i32)),
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(()) // Pipes have nothing to flush at the fd level
    }
}

/// Sends serde-serializable messages, one JSON document per line.
pub struct MessageWriter {
    inner: BufWriter<PipeFd>,
}

impl MessageWriter {
    pub fn new(fd: PipeFd) -> Self {
        Self {
            inner: BufWriter::new(fd),
        }
    }

    /// Serialize `msg` and write it as a single line, flushing immediately so
    /// the peer never waits on a partially buffered message.
    pub fn send<T: Serialize>(&mut self, msg: &T) -> io::Result<()> {
        let json = serde_json::to_string(msg)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.inner.write_all(json.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.inner.flush()
    }
}

/// Receives newline-delimited JSON messages.
pub struct MessageReader {
    inner: BufReader<PipeFd>,
    line: String,
}

impl MessageReader {
    pub fn new(fd: PipeFd) -> Self {
        Self {
            inner: BufReader::new(fd),
            line: String::with_capacity(256),
        }
    }

    /// Read and parse the next message. Returns `None` when the peer has
    /// closed its end of the pipe (EOF).
    pub fn recv<T: DeserializeOwned>(&mut self) -> io::Result<Option<T>> {
        self.line.clear();
        match self.inner.read_line(&mut self.line)? {
            0 => Ok(None),
            _ => {
                let msg = serde_json::from_str(self.line.trim_end())
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                Ok(Some(msg))
            }
        }
    }
}
