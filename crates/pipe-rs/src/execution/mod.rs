//! Execution layer: fork, descriptor redirection and the per-role loops
//!
//! # Features
//!
//! - **Spawner**: one channel, one fork, a parent and a child context
//! - **Redirection**: bind a channel end onto stdin or stdout
//! - **Roles**: the child's echo loop and the parent's unbuffered send
//!
//! # Examples
//!
//! ```ignore
//! use pipe_rs::execution::{ExecutionContext, Spawner};
//!
//! match Spawner::spawn()? {
//!     ExecutionContext::Parent(parent) => { /* write */ }
//!     ExecutionContext::Child(child) => { /* read */ }
//! }
//! ```

pub mod process;
pub mod redirect;
pub mod roles;

pub use process::{
    ChildContext, ChildExit, ChildHandle, ExecutionContext, ParentContext, Role, Spawner,
};
pub use redirect::{StdinBinding, StdoutBinding, bind_onto};
pub use roles::{EchoSummary, StreamEnd, echo, send};
