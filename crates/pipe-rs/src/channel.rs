//! Anonymous unidirectional byte channel
//!
//! A [`Channel`] wraps the two descriptors returned by `pipe(2)`. Each end owns
//! its descriptor, so an end is closed exactly once: either explicitly through
//! `close()` (which reports the error) or silently on drop.

use log::debug;
use nix::errno::Errno;
use nix::unistd::{close, pipe, read, write};
use pipe_core::{PipeError, Result};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};

/// Both ends of a freshly created pipe
#[derive(Debug)]
pub struct Channel {
    producer: ProducerEnd,
    consumer: ConsumerEnd,
}

impl Channel {
    /// Allocate a new pipe.
    ///
    /// Fails with [`PipeError::Syscall`] when the process or system descriptor
    /// table is exhausted.
    pub fn open() -> Result<Self> {
        let (read_end, write_end) = pipe().map_err(|e| PipeError::syscall("pipe", e))?;
        debug!(
            "Opened channel: consumer fd {}, producer fd {}",
            read_end.as_raw_fd(),
            write_end.as_raw_fd()
        );

        Ok(Self {
            producer: ProducerEnd { fd: write_end },
            consumer: ConsumerEnd { fd: read_end },
        })
    }

    pub fn producer(&self) -> &ProducerEnd {
        &self.producer
    }

    pub fn consumer(&self) -> &ConsumerEnd {
        &self.consumer
    }

    /// Split into (producer, consumer)
    pub fn into_ends(self) -> (ProducerEnd, ConsumerEnd) {
        (self.producer, self.consumer)
    }
}

/// Writable side of a channel
#[derive(Debug)]
pub struct ProducerEnd {
    fd: OwnedFd,
}

impl ProducerEnd {
    pub fn raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    /// Write every byte with unbuffered `write(2)` calls
    pub fn write_all(&self, bytes: &[u8]) -> Result<usize> {
        write_all_fd(self.fd.as_fd(), bytes)
    }

    /// Close the descriptor, surfacing any error from `close(2)`
    pub fn close(self) -> Result<()> {
        close_owned(self.fd, "producer")
    }

    pub fn into_owned_fd(self) -> OwnedFd {
        self.fd
    }
}

impl AsFd for ProducerEnd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

/// Readable side of a channel
#[derive(Debug)]
pub struct ConsumerEnd {
    fd: OwnedFd,
}

impl ConsumerEnd {
    pub fn raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    /// Read a single byte; `None` means end-of-file
    pub fn read_byte(&self) -> Result<Option<u8>> {
        read_byte_fd(self.fd.as_fd())
    }

    /// Close the descriptor, surfacing any error from `close(2)`
    pub fn close(self) -> Result<()> {
        close_owned(self.fd, "consumer")
    }

    pub fn into_owned_fd(self) -> OwnedFd {
        self.fd
    }
}

impl AsFd for ConsumerEnd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

fn close_owned(fd: OwnedFd, end: &str) -> Result<()> {
    let raw = fd.into_raw_fd();
    debug!("Closing {} end (fd {})", end, raw);
    close(raw).map_err(|e| PipeError::syscall("close", e))
}

/// Write the whole buffer, retrying short writes and `EINTR`
pub(crate) fn write_all_fd(fd: BorrowedFd<'_>, bytes: &[u8]) -> Result<usize> {
    let mut written = 0;
    while written < bytes.len() {
        match write(fd, &bytes[written..]) {
            Ok(0) => {
                return Err(PipeError::Io(std::io::Error::from(
                    std::io::ErrorKind::WriteZero,
                )));
            }
            Ok(n) => written += n,
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(PipeError::syscall("write", e)),
        }
    }
    Ok(written)
}

/// Blocking single-byte read; `None` on end-of-file
pub(crate) fn read_byte_fd(fd: BorrowedFd<'_>) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match read(fd.as_raw_fd(), &mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(PipeError::syscall("read", e)),
        }
    }
}
