//! Process spawning: one channel, one fork, two execution contexts
//!
//! After [`Spawner::spawn`] both processes hold copies of both channel ends.
//! Each context's `close_unused` drops the end that role never touches; the
//! remaining end is what the role reads or writes.

use log::{debug, info};
use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork, getppid};
use pipe_core::util::{current_pid, flush_stdio};
use pipe_core::{PipeError, Result};
use serde::Serialize;
use std::fmt;
use std::os::unix::io::RawFd;

use crate::channel::{Channel, ConsumerEnd, ProducerEnd};

/// Which side of the fork a context is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Parent,
    Child,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Parent => write!(f, "parent"),
            Role::Child => write!(f, "child"),
        }
    }
}

/// The two processes produced by a fork
#[derive(Debug)]
pub enum ExecutionContext {
    Parent(ParentContext),
    Child(ChildContext),
}

impl ExecutionContext {
    pub fn role(&self) -> Role {
        match self {
            ExecutionContext::Parent(_) => Role::Parent,
            ExecutionContext::Child(_) => Role::Child,
        }
    }

    pub fn pid(&self) -> Pid {
        match self {
            ExecutionContext::Parent(ctx) => ctx.pid,
            ExecutionContext::Child(ctx) => ctx.pid,
        }
    }
}

/// Creates the channel and forks
pub struct Spawner;

impl Spawner {
    /// Open a channel and fork around it
    pub fn spawn() -> Result<ExecutionContext> {
        let channel = Channel::open()?;
        Self::fork_with(channel)
    }

    /// Fork with an already opened channel.
    ///
    /// Buffered stdout/stderr is flushed first so the child does not inherit
    /// and later re-emit bytes the parent had queued.
    pub fn fork_with(channel: Channel) -> Result<ExecutionContext> {
        flush_stdio()?;
        let (producer, consumer) = channel.into_ends();

        // SAFETY: the child only performs descriptor operations and plain
        // reads/writes before exiting with _exit.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                info!("Forked child {}", child);
                Ok(ExecutionContext::Parent(ParentContext {
                    pid: current_pid(),
                    child,
                    producer,
                    consumer,
                }))
            }
            Ok(ForkResult::Child) => Ok(ExecutionContext::Child(ChildContext {
                pid: current_pid(),
                parent: getppid(),
                producer,
                consumer,
            })),
            Err(e) => Err(PipeError::syscall("fork", e)),
        }
    }
}

/// Parent side of the fork, still holding both channel ends
#[derive(Debug)]
pub struct ParentContext {
    pid: Pid,
    child: Pid,
    producer: ProducerEnd,
    consumer: ConsumerEnd,
}

impl ParentContext {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn child_pid(&self) -> Pid {
        self.child
    }

    pub fn consumer_fd(&self) -> RawFd {
        self.consumer.raw_fd()
    }

    /// Close the consumer end and hand back the producer plus a handle on
    /// the child
    pub fn close_unused(self) -> Result<(ChildHandle, ProducerEnd)> {
        self.consumer.close()?;
        Ok((ChildHandle::new(self.child), self.producer))
    }
}

/// Child side of the fork, still holding both channel ends
#[derive(Debug)]
pub struct ChildContext {
    pid: Pid,
    parent: Pid,
    producer: ProducerEnd,
    consumer: ConsumerEnd,
}

impl ChildContext {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn parent_pid(&self) -> Pid {
        self.parent
    }

    pub fn producer_fd(&self) -> RawFd {
        self.producer.raw_fd()
    }

    /// Close the producer end and hand back the consumer.
    ///
    /// Skipping this would keep a write end open in the child, so the child
    /// would never see end-of-file on its own channel.
    pub fn close_unused(self) -> Result<ConsumerEnd> {
        self.producer.close()?;
        Ok(self.consumer)
    }
}

/// How a reaped child ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildExit {
    Exited(i32),
    Signaled(i32),
}

impl ChildExit {
    /// Shell-style status: exit code, or 128 + signal number
    pub fn code(&self) -> i32 {
        match self {
            ChildExit::Exited(code) => *code,
            ChildExit::Signaled(signal) => 128 + signal,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, ChildExit::Exited(0))
    }
}

/// Handle on the forked child, used to optionally reap it
#[derive(Debug)]
pub struct ChildHandle {
    pid: Pid,
    reaped: bool,
}

impl ChildHandle {
    pub fn new(pid: Pid) -> Self {
        Self { pid, reaped: false }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Block until the child terminates.
    ///
    /// Not calling this leaves the child to be reparented once the parent
    /// exits.
    pub fn wait(&mut self) -> Result<ChildExit> {
        if self.reaped {
            return Err(PipeError::ChildMissing);
        }

        let exit = wait_for_child(self.pid)?;
        self.reaped = true;
        debug!("Child {} finished: {:?}", self.pid, exit);
        Ok(exit)
    }
}

/// Wait for child process and get exit status
fn wait_for_child(pid: Pid) -> Result<ChildExit> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, status)) => return Ok(ChildExit::Exited(status)),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                return Ok(ChildExit::Signaled(signal as i32));
            }
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return Err(PipeError::ChildMissing),
            Err(e) => return Err(PipeError::syscall("waitpid", e)),
        }
    }
}
