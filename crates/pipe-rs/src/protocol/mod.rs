//! Channel protocol: framing and the per-byte transform

pub mod framing;
pub mod transform;

pub use framing::{FrameDecoder, Framing, SENTINEL};
pub use transform::{DEFAULT_SHIFT, Transform};
