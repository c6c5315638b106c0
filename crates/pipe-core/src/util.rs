//! Descriptor and process helpers shared by the pipe crates

use nix::errno::Errno;
use nix::fcntl::{FcntlArg, fcntl};
use nix::unistd::{Pid, getpid};
use std::io::{self, Write};
use std::os::unix::io::RawFd;

/// Standard input descriptor number
pub const STDIN_FD: RawFd = libc::STDIN_FILENO;

/// Standard output descriptor number
pub const STDOUT_FD: RawFd = libc::STDOUT_FILENO;

/// Check whether a descriptor number refers to an open file description.
///
/// Returns false only for `EBADF`; any other failure is treated as open.
pub fn fd_is_open(fd: RawFd) -> bool {
    !matches!(fcntl(fd, FcntlArg::F_GETFD), Err(Errno::EBADF))
}

/// Flush the buffered standard streams.
///
/// Called before fork and before aliasing fd 1, so buffered bytes are neither
/// duplicated into the child nor written into the channel later.
pub fn flush_stdio() -> io::Result<()> {
    io::stdout().flush()?;
    io::stderr().flush()
}

/// Current process id
pub fn current_pid() -> Pid {
    getpid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::AsRawFd;

    #[test]
    fn test_standard_descriptor_numbers() {
        assert_eq!(STDIN_FD, 0);
        assert_eq!(STDOUT_FD, 1);
    }

    #[test]
    fn test_open_file_is_reported_open() {
        let file = tempfile::tempfile().unwrap();
        assert!(fd_is_open(file.as_raw_fd()));
    }

    #[test]
    fn test_negative_descriptor_is_closed() {
        assert!(!fd_is_open(-1));
    }

    #[test]
    fn test_current_pid_matches_std() {
        assert_eq!(current_pid().as_raw() as u32, std::process::id());
    }

    #[test]
    fn test_flush_stdio_succeeds() {
        assert!(flush_stdio().is_ok());
    }
}
