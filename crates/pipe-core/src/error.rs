//! Error types for pipe operations

use std::io;
use thiserror::Error;

/// Result type for pipe operations
pub type Result<T> = std::result::Result<T, PipeError>;

/// Errors that can occur while wiring up or driving a channel
#[derive(Error, Debug)]
pub enum PipeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Syscall error: {0}")]
    Syscall(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Payload contains the sentinel byte at offset {offset}")]
    SentinelInPayload { offset: usize },

    #[error("Frame of {len} bytes does not fit a length prefix")]
    FrameTooLarge { len: usize },

    #[error("No such child process")]
    ChildMissing,
}

impl PipeError {
    /// Wrap a nix errno with the name of the call that produced it
    pub fn syscall(call: &str, errno: nix::errno::Errno) -> Self {
        PipeError::Syscall(format!("{} failed: {}", call, errno))
    }
}
