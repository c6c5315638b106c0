//! Aliasing channel ends onto standard input / output
//!
//! `dup2` rewrites the process-wide descriptor table. These bindings confine
//! that to one call per role: the child binds its consumer end onto fd 0, the
//! parent binds its producer end onto fd 1 and can later restore the original
//! stdout.

use log::debug;
use nix::unistd::{dup, dup2};
use pipe_core::util::{STDIN_FD, STDOUT_FD, flush_stdio};
use pipe_core::{PipeError, Result};
use std::io;
use std::os::fd::{AsFd, AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};

use crate::channel::{ConsumerEnd, ProducerEnd, write_all_fd};

/// Replace `target` with `fd` and close the original descriptor number.
///
/// Any descriptor previously at `target` is discarded. If `fd` already sits
/// at `target` nothing is duplicated and it stays open.
pub fn bind_onto(fd: OwnedFd, target: RawFd) -> Result<()> {
    let raw = fd.as_raw_fd();
    if raw == target {
        let _ = fd.into_raw_fd();
        return Ok(());
    }

    dup2(raw, target).map_err(|e| PipeError::syscall("dup2", e))?;
    debug!("Bound fd {} onto fd {}", raw, target);
    drop(fd);
    Ok(())
}

/// The child's consumer end living at fd 0
#[derive(Debug)]
pub struct StdinBinding {
    _private: (),
}

impl StdinBinding {
    pub fn bind(consumer: ConsumerEnd) -> Result<Self> {
        bind_onto(consumer.into_owned_fd(), STDIN_FD)?;
        Ok(Self { _private: () })
    }
}

/// The parent's producer end living at fd 1.
///
/// The original stdout is kept aside and put back by [`restore`](Self::restore)
/// or on drop. Restoring also closes the last parent copy of the producer, so
/// the child sees end-of-file.
#[derive(Debug)]
pub struct StdoutBinding {
    saved: Option<OwnedFd>,
}

impl StdoutBinding {
    /// Alias the producer end onto fd 1.
    ///
    /// Buffered stdout is flushed first; bytes queued before the bind belong
    /// to the old stdout, not the channel.
    pub fn bind(producer: ProducerEnd) -> Result<Self> {
        flush_stdio()?;

        let saved_raw = dup(STDOUT_FD).map_err(|e| PipeError::syscall("dup", e))?;
        // SAFETY: dup just returned this descriptor and nothing else owns it
        let saved = unsafe { OwnedFd::from_raw_fd(saved_raw) };

        bind_onto(producer.into_owned_fd(), STDOUT_FD)?;
        Ok(Self { saved: Some(saved) })
    }

    /// Unbuffered write to fd 1, i.e. into the channel
    pub fn write_frame(&self, bytes: &[u8]) -> Result<usize> {
        write_all_fd(io::stdout().as_fd(), bytes)
    }

    /// Put the original stdout back
    pub fn restore(mut self) -> Result<()> {
        self.restore_saved()
    }

    fn restore_saved(&mut self) -> Result<()> {
        let Some(saved) = self.saved.take() else {
            return Ok(());
        };

        // Formatted output issued while bound goes to the channel. A failed
        // flush is reported only once fd 1 is back on the original stdout.
        let flushed = flush_stdio();
        dup2(saved.as_raw_fd(), STDOUT_FD).map_err(|e| PipeError::syscall("dup2", e))?;
        debug!("Restored stdout from fd {}", saved.as_raw_fd());
        flushed.map_err(PipeError::from)
    }
}

impl Drop for StdoutBinding {
    fn drop(&mut self) {
        let _ = self.restore_saved();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use pipe_core::util::fd_is_open;

    #[test]
    fn bind_onto_moves_descriptor() {
        let (producer, consumer) = Channel::open().unwrap().into_ends();
        let target = Channel::open().unwrap().into_ends().0.into_owned_fd();
        let target_raw = target.into_raw_fd();

        bind_onto(producer.into_owned_fd(), target_raw).unwrap();

        // SAFETY: target_raw now aliases the producer end and is owned here
        let aliased = unsafe { OwnedFd::from_raw_fd(target_raw) };
        write_all_fd(aliased.as_fd(), b"q").unwrap();
        drop(aliased);

        assert_eq!(consumer.read_byte().unwrap(), Some(b'q'));
        assert_eq!(consumer.read_byte().unwrap(), None);
    }

    #[test]
    fn bind_onto_same_number_keeps_descriptor_open() {
        let (producer, _consumer) = Channel::open().unwrap().into_ends();
        let raw = producer.raw_fd();

        bind_onto(producer.into_owned_fd(), raw).unwrap();
        assert!(fd_is_open(raw));

        // SAFETY: reclaim the descriptor left open above so the test closes it
        drop(unsafe { OwnedFd::from_raw_fd(raw) });
    }

    /// Runs in a forked child so the test harness keeps its own stdout
    #[test]
    fn restore_puts_stdout_back_when_flush_fails() {
        use nix::sys::stat::fstat;
        use nix::sys::wait::{WaitStatus, waitpid};
        use nix::unistd::{ForkResult, fork};
        use std::io::Write;

        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                let ok = (|| -> Option<bool> {
                    let before = fstat(STDOUT_FD).ok()?.st_ino;
                    let (producer, consumer) = Channel::open().ok()?.into_ends();

                    let binding = StdoutBinding::bind(producer).ok()?;
                    drop(consumer);
                    io::stdout().write_all(b"x").ok()?;

                    // The buffered byte hits a closed channel: EPIPE
                    let restored = binding.restore();
                    let after = fstat(STDOUT_FD).ok()?.st_ino;
                    Some(restored.is_err() && before == after)
                })()
                .unwrap_or(false);

                unsafe { libc::_exit(if ok { 0 } else { 1 }) }
            }
            Ok(ForkResult::Parent { child }) => {
                let status = waitpid(child, None).unwrap();
                assert!(
                    matches!(status, WaitStatus::Exited(_, 0)),
                    "stdout not restored after failed flush: {:?}",
                    status
                );
            }
            Err(e) => panic!("fork failed: {}", e),
        }
    }
}
