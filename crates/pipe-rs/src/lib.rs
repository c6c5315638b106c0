//! pipe-rs: parent/child communication over an anonymous pipe
//!
//! A parent process opens a pipe, forks, and feeds the child's standard input
//! from its own standard output. The child decodes the frame, shifts every
//! byte and echoes the result.
//!
//! # Variants
//!
//! - **Echo** (default): the parent sends one framed payload; the child adds
//!   a fixed shift to each byte and writes it out immediately.
//! - **Greeting**: the parent writes an unframed greeting naming the child
//!   pid; the child relays it verbatim until end-of-file.
//!
//! # Example
//!
//! ```ignore
//! use pipe_rs::Session;
//!
//! let report = Session::builder()
//!     .message("AB")
//!     .wait(true)
//!     .build()?
//!     .run()?;
//! // the child has printed "CD\n"
//! println!("child exit: {:?}", report.child_exit);
//! ```

pub mod channel;
pub mod controller;
pub mod execution;
pub mod protocol;

pub use pipe_core::{self as core, PipeError, Result, util};

pub use channel::{Channel, ConsumerEnd, ProducerEnd};
pub use controller::{
    DEFAULT_MESSAGE, Session, SessionBuilder, SessionConfig, SessionReport, Variant,
};
pub use execution::{
    ChildContext, ChildExit, ChildHandle, EchoSummary, ExecutionContext, ParentContext, Role,
    Spawner, StdinBinding, StdoutBinding, StreamEnd,
};
pub use protocol::{DEFAULT_SHIFT, FrameDecoder, Framing, SENTINEL, Transform};
