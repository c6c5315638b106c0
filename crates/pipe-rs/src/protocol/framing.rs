//! Message framing on the channel
//!
//! The default framing is the sentinel protocol: payload bytes followed by a
//! single `0x00`. A payload that itself contains `0x00` would make the reader
//! stop early, which is a limitation of the protocol; the encoder refuses such
//! payloads instead of sending a frame the reader would truncate.
//!
//! `LengthPrefixed` frames carry a 4-byte big-endian length instead and may
//! hold any byte. For payloads without `0x00` both framings produce the same
//! decoded bytes.

use pipe_core::{PipeError, Result};
use serde::Serialize;

/// Frame terminator for [`Framing::Sentinel`]
pub const SENTINEL: u8 = 0x00;

const LENGTH_PREFIX_BYTES: usize = 4;

/// How a message is delimited on the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    /// Payload followed by one `0x00`
    #[default]
    Sentinel,
    /// 4-byte big-endian length followed by the payload
    LengthPrefixed,
}

impl Framing {
    /// Encode a payload into a single frame
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        match self {
            Framing::Sentinel => {
                if let Some(offset) = payload.iter().position(|&b| b == SENTINEL) {
                    return Err(PipeError::SentinelInPayload { offset });
                }
                let mut frame = Vec::with_capacity(payload.len() + 1);
                frame.extend_from_slice(payload);
                frame.push(SENTINEL);
                Ok(frame)
            }
            Framing::LengthPrefixed => {
                let len = u32::try_from(payload.len())
                    .map_err(|_| PipeError::FrameTooLarge { len: payload.len() })?;
                let mut frame = Vec::with_capacity(payload.len() + LENGTH_PREFIX_BYTES);
                frame.extend_from_slice(&len.to_be_bytes());
                frame.extend_from_slice(payload);
                Ok(frame)
            }
        }
    }

    pub fn decoder(&self) -> FrameDecoder {
        match self {
            Framing::Sentinel => FrameDecoder {
                state: DecodeState::Sentinel,
            },
            Framing::LengthPrefixed => FrameDecoder {
                state: DecodeState::Header {
                    buf: [0; LENGTH_PREFIX_BYTES],
                    filled: 0,
                },
            },
        }
    }
}

#[derive(Debug, Clone)]
enum DecodeState {
    Sentinel,
    Header {
        buf: [u8; LENGTH_PREFIX_BYTES],
        filled: usize,
    },
    Body {
        remaining: u32,
    },
    Unframed,
    Complete,
}

/// Byte-at-a-time frame decoder.
///
/// Feed each byte read from the channel; a returned byte is payload. Once
/// [`is_complete`](Self::is_complete) turns true the frame is over and the
/// reader stops.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: DecodeState,
}

impl FrameDecoder {
    /// Decoder for a stream with no framing at all: every byte is payload and
    /// only end-of-file ends it.
    pub fn unframed() -> Self {
        Self {
            state: DecodeState::Unframed,
        }
    }

    pub fn feed(&mut self, byte: u8) -> Option<u8> {
        match &mut self.state {
            DecodeState::Sentinel => {
                if byte == SENTINEL {
                    self.state = DecodeState::Complete;
                    None
                } else {
                    Some(byte)
                }
            }
            DecodeState::Header { buf, filled } => {
                buf[*filled] = byte;
                *filled += 1;
                if *filled == LENGTH_PREFIX_BYTES {
                    let remaining = u32::from_be_bytes(*buf);
                    self.state = if remaining == 0 {
                        DecodeState::Complete
                    } else {
                        DecodeState::Body { remaining }
                    };
                }
                None
            }
            DecodeState::Body { remaining } => {
                *remaining -= 1;
                if *remaining == 0 {
                    self.state = DecodeState::Complete;
                }
                Some(byte)
            }
            DecodeState::Unframed => Some(byte),
            DecodeState::Complete => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, DecodeState::Complete)
    }

    /// True if end-of-file now would cut a frame short.
    ///
    /// Sentinel and unframed streams never count as truncated: end-of-file
    /// ends them the same way the sentinel does.
    pub fn is_truncated(&self) -> bool {
        match &self.state {
            DecodeState::Header { filled, .. } => *filled > 0,
            DecodeState::Body { .. } => true,
            _ => false,
        }
    }
}
