//! Session controller: one channel, one fork, both roles

use std::io;
use std::os::fd::{AsFd, OwnedFd};

use log::{error, info};
use nix::unistd::Pid;
use serde::Serialize;

use pipe_core::util::STDOUT_FD;
use pipe_core::{PipeError, Result};

use crate::execution::{
    ChildContext, ChildExit, EchoSummary, ExecutionContext, ParentContext, Spawner, StdinBinding,
    StdoutBinding, bind_onto, echo, send,
};
use crate::protocol::{FrameDecoder, Framing, Transform};

/// Payload used when none is configured
pub const DEFAULT_MESSAGE: &str = "Hello from parent";

/// Which of the two demonstration programs to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Framed payload, transformed and echoed by the child
    #[default]
    Echo,
    /// Unframed greeting naming the child pid, relayed verbatim
    Greeting,
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub variant: Variant,
    pub framing: Framing,
    pub transform: Transform,
    /// Payload sent by the parent in the echo variant
    pub payload: Vec<u8>,
    /// Reap the child before returning
    pub wait: bool,
    /// Alias the producer end onto the parent's stdout before writing
    pub bind_parent_stdout: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Echo,
            framing: Framing::Sentinel,
            transform: Transform::default(),
            payload: DEFAULT_MESSAGE.as_bytes().to_vec(),
            wait: false,
            bind_parent_stdout: true,
        }
    }
}

impl SessionConfig {
    /// Check the payload can be framed before anything is forked
    pub fn validate(&self) -> Result<()> {
        if self.variant == Variant::Echo {
            self.framing.encode(&self.payload)?;
        }
        Ok(())
    }

    /// Bytes the parent writes into the channel
    pub fn frame_for(&self, child: Pid) -> Result<Vec<u8>> {
        match self.variant {
            Variant::Echo => self.framing.encode(&self.payload),
            Variant::Greeting => Ok(greeting(child).into_bytes()),
        }
    }

    fn child_decoder(&self) -> FrameDecoder {
        match self.variant {
            Variant::Echo => self.framing.decoder(),
            Variant::Greeting => FrameDecoder::unframed(),
        }
    }

    fn child_transform(&self) -> Transform {
        match self.variant {
            Variant::Echo => self.transform,
            Variant::Greeting => Transform::Identity,
        }
    }
}

/// Text written by the parent in the greeting variant
pub fn greeting(child: Pid) -> String {
    format!("Hello from parent\nchild pid = {}\n", child)
}

/// Builder pattern for session creation
#[derive(Debug, Default)]
pub struct SessionBuilder {
    config: SessionConfig,
    capture: Option<OwnedFd>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set raw payload bytes
    pub fn payload(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.config.payload = bytes.into();
        self
    }

    /// Set payload from text
    pub fn message(self, text: &str) -> Self {
        self.payload(text.as_bytes())
    }

    /// Set payload from a hex string (e.g. "4142")
    pub fn payload_hex(self, hex: &str) -> Result<Self> {
        let bytes = parse_hex(hex)?;
        Ok(self.payload(bytes))
    }

    pub fn variant(mut self, variant: Variant) -> Self {
        self.config.variant = variant;
        self
    }

    pub fn framing(mut self, framing: Framing) -> Self {
        self.config.framing = framing;
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.config.transform = transform;
        self
    }

    /// Shorthand for `transform(Transform::Shift(n))`
    pub fn shift(self, n: u8) -> Self {
        self.transform(Transform::Shift(n))
    }

    /// Reap the child before `run` returns
    pub fn wait(mut self, wait: bool) -> Self {
        self.config.wait = wait;
        self
    }

    pub fn bind_parent_stdout(mut self, bind: bool) -> Self {
        self.config.bind_parent_stdout = bind;
        self
    }

    /// Have the child write its output to `fd` instead of the inherited stdout
    pub fn capture_child_stdout(mut self, fd: OwnedFd) -> Self {
        self.capture = Some(fd);
        self
    }

    pub fn build(self) -> Result<Session> {
        self.config.validate()?;
        Ok(Session {
            config: self.config,
            capture: self.capture,
        })
    }
}

/// What the parent observed during a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub parent_pid: i32,
    pub child_pid: i32,
    pub variant: Variant,
    pub framing: Framing,
    pub transform: Transform,
    pub payload_len: usize,
    /// Bytes written into the channel, framing included
    pub bytes_sent: usize,
    /// Set only when the session waited for the child
    pub child_exit: Option<ChildExit>,
}

/// A configured, not yet started session
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    capture: Option<OwnedFd>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open the channel, fork and run both roles.
    ///
    /// Returns in the parent only. The child runs its loop and exits the
    /// process with status 0 whatever happened; failures there are logged.
    pub fn run(self) -> Result<SessionReport> {
        let Session { config, capture } = self;

        match Spawner::spawn()? {
            ExecutionContext::Parent(parent) => {
                drop(capture);
                run_parent(parent, &config)
            }
            ExecutionContext::Child(child) => {
                if let Err(e) = run_child(child, &config, capture) {
                    error!("Child failed: {}", e);
                }
                // SAFETY: terminate the forked child without running the
                // parent's exit handlers or unwinding into its caller
                unsafe { libc::_exit(0) }
            }
        }
    }
}

fn run_parent(parent: ParentContext, config: &SessionConfig) -> Result<SessionReport> {
    let parent_pid = parent.pid();
    let (mut child, producer) = parent.close_unused()?;
    let frame = config.frame_for(child.pid())?;

    let bytes_sent = if config.bind_parent_stdout {
        let binding = StdoutBinding::bind(producer)?;
        let written = binding.write_frame(&frame)?;
        binding.restore()?;
        written
    } else {
        let written = send(producer.as_fd(), &frame)?;
        producer.close()?;
        written
    };
    info!("Parent {} sent {} bytes to {}", parent_pid, bytes_sent, child.pid());

    let child_exit = if config.wait {
        Some(child.wait()?)
    } else {
        None
    };

    Ok(SessionReport {
        parent_pid: parent_pid.as_raw(),
        child_pid: child.pid().as_raw(),
        variant: config.variant,
        framing: config.framing,
        transform: config.transform,
        payload_len: match config.variant {
            Variant::Echo => config.payload.len(),
            Variant::Greeting => frame.len(),
        },
        bytes_sent,
        child_exit,
    })
}

fn run_child(
    child: ChildContext,
    config: &SessionConfig,
    capture: Option<OwnedFd>,
) -> Result<EchoSummary> {
    if let Some(fd) = capture {
        bind_onto(fd, STDOUT_FD)?;
    }

    let consumer = child.close_unused()?;
    let _stdin = StdinBinding::bind(consumer)?;

    echo(
        io::stdin().as_fd(),
        io::stdout().as_fd(),
        config.child_decoder(),
        config.child_transform(),
    )
}

fn parse_hex(hex: &str) -> Result<Vec<u8>> {
    let digits: Vec<char> = hex.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(PipeError::InvalidConfig(format!(
            "hex payload has odd length: {}",
            digits.len()
        )));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let text: String = pair.iter().collect();
            u8::from_str_radix(&text, 16)
                .map_err(|_| PipeError::InvalidConfig(format!("invalid hex byte: {}", text)))
        })
        .collect()
}
