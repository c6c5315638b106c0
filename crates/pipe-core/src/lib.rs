//! pipe-core: shared types and errors for pipe-rs
//!
//! This crate provides the foundational pieces used by the other pipe crates:
//! - Error types and Result alias
//! - Descriptor utilities (open checks, stdio flushing, well-known fd numbers)

pub mod error;
pub mod util;

pub use error::{PipeError, Result};
