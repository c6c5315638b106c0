//! What each side does with its channel end once bound

use log::{debug, warn};
use pipe_core::Result;
use serde::Serialize;
use std::os::fd::BorrowedFd;

use crate::channel::{read_byte_fd, write_all_fd};
use crate::protocol::{FrameDecoder, Transform};

/// Why the child's read loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEnd {
    /// The frame terminator (or declared length) was reached
    FrameComplete,
    /// The producer side closed first
    EndOfFile,
}

/// Counters from one run of the echo loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EchoSummary {
    /// Bytes read from the channel, framing included
    pub bytes_read: usize,
    /// Payload bytes transformed and written
    pub bytes_echoed: usize,
    pub ended_by: StreamEnd,
}

/// Child role: decode, transform and echo byte by byte.
///
/// Each payload byte is written as soon as it is read. End-of-file stops the
/// loop the same way the frame terminator does. A single `\n` follows the
/// echoed bytes.
pub fn echo(
    input: BorrowedFd<'_>,
    output: BorrowedFd<'_>,
    mut decoder: FrameDecoder,
    transform: Transform,
) -> Result<EchoSummary> {
    let mut bytes_read = 0;
    let mut bytes_echoed = 0;

    let ended_by = loop {
        let Some(byte) = read_byte_fd(input)? else {
            if decoder.is_truncated() {
                warn!("Channel closed mid-frame after {} bytes", bytes_read);
            }
            break StreamEnd::EndOfFile;
        };
        bytes_read += 1;

        if let Some(payload) = decoder.feed(byte) {
            write_all_fd(output, &[transform.apply(payload)])?;
            bytes_echoed += 1;
        }

        if decoder.is_complete() {
            break StreamEnd::FrameComplete;
        }
    };

    write_all_fd(output, b"\n")?;
    debug!(
        "Echo loop done: read {}, echoed {}, {:?}",
        bytes_read, bytes_echoed, ended_by
    );

    Ok(EchoSummary {
        bytes_read,
        bytes_echoed,
        ended_by,
    })
}

/// Parent role: push one encoded frame with unbuffered writes
pub fn send(output: BorrowedFd<'_>, frame: &[u8]) -> Result<usize> {
    let written = write_all_fd(output, frame)?;
    debug!("Sent {} bytes", written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::protocol::Framing;
    use std::os::fd::AsFd;

    /// Run the echo loop over `input` and collect what it writes
    fn run_echo(
        input: &[u8],
        decoder: FrameDecoder,
        transform: Transform,
    ) -> (Vec<u8>, EchoSummary) {
        let (inbound_tx, inbound_rx) = Channel::open().unwrap().into_ends();
        let (outbound_tx, outbound_rx) = Channel::open().unwrap().into_ends();

        send(inbound_tx.as_fd(), input).unwrap();
        drop(inbound_tx);

        let summary = echo(inbound_rx.as_fd(), outbound_tx.as_fd(), decoder, transform).unwrap();
        drop(outbound_tx);

        let mut out = Vec::new();
        while let Some(b) = outbound_rx.read_byte().unwrap() {
            out.push(b);
        }
        (out, summary)
    }

    #[test]
    fn round_trip_ab_becomes_cd() {
        let frame = Framing::Sentinel.encode(b"AB").unwrap();
        let (out, summary) = run_echo(&frame, Framing::Sentinel.decoder(), Transform::default());

        assert_eq!(out, b"CD\n");
        assert_eq!(summary.bytes_echoed, 2);
        assert_eq!(summary.ended_by, StreamEnd::FrameComplete);
    }

    #[test]
    fn empty_input_ends_on_eof_without_echo() {
        let (out, summary) = run_echo(&[], Framing::Sentinel.decoder(), Transform::default());

        assert_eq!(out, b"\n");
        assert_eq!(summary.bytes_read, 0);
        assert_eq!(summary.ended_by, StreamEnd::EndOfFile);
    }

    #[test]
    fn missing_sentinel_treated_as_end() {
        let (out, summary) = run_echo(b"AB", Framing::Sentinel.decoder(), Transform::default());

        assert_eq!(out, b"CD\n");
        assert_eq!(summary.ended_by, StreamEnd::EndOfFile);
    }

    #[test]
    fn embedded_sentinel_stops_early() {
        let (out, _) = run_echo(b"A\0B\0", Framing::Sentinel.decoder(), Transform::default());
        assert_eq!(out, b"C\n");
    }

    #[test]
    fn bytes_after_frame_are_left_unread() {
        let (_, summary) = run_echo(b"AB\0ZZZ", Framing::Sentinel.decoder(), Transform::default());
        assert_eq!(summary.bytes_read, 3);
    }

    #[test]
    fn length_prefixed_echo_matches_sentinel_echo() {
        let frame = Framing::LengthPrefixed.encode(b"Hello").unwrap();
        let (out, summary) =
            run_echo(&frame, Framing::LengthPrefixed.decoder(), Transform::default());

        assert_eq!(out, b"Jgnnq\n");
        assert_eq!(summary.bytes_read, 9);
    }

    #[test]
    fn truncated_length_prefixed_frame_stops_on_eof() {
        let (out, summary) = run_echo(
            &[0, 0, 0, 5, b'A'],
            Framing::LengthPrefixed.decoder(),
            Transform::default(),
        );

        assert_eq!(out, b"C\n");
        assert_eq!(summary.ended_by, StreamEnd::EndOfFile);
    }

    #[test]
    fn unframed_relay_copies_until_eof() {
        let (out, _) = run_echo(b"Hello\0there\n", FrameDecoder::unframed(), Transform::Identity);
        assert_eq!(out, b"Hello\0there\n\n");
    }

    #[test]
    fn shift_wraps_high_bytes() {
        let frame = Framing::Sentinel.encode(&[0xFE, 0xFF]).unwrap();
        let (out, _) = run_echo(&frame, Framing::Sentinel.decoder(), Transform::Shift(2));
        assert_eq!(out, vec![0x00, 0x01, b'\n']);
    }
}
