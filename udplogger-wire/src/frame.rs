// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Framing of log lines into UDP datagrams.
//!
//! Wire format:
//!
//! ```text
//! <serial: ASCII decimal> 0x1E <tag: 0..10 bytes> 0x1E <log line, trimmed> 0x00
//! ```
//!
//! The log line itself may contain further 0x1E separators between its own
//! fields; only the first two delimit the frame header. Receivers stop
//! reading at the first NUL.

use crate::constants::{DELIMITER, PACKET_MAXIMUM_SIZE};

/// Build one log datagram. `line` must already be trimmed; `tag` must be at
/// most [`crate::constants::TAG_MAXIMUM_LENGTH`] bytes (enforced when the
/// publisher configuration is built).
///
/// The result never exceeds [`PACKET_MAXIMUM_SIZE`] bytes and is always
/// NUL-terminated: when the pieces would overflow, only the log payload is
/// truncated, never the serial or the tag.
#[must_use]
pub fn encode(serial: u64, tag: &str, line: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(PACKET_MAXIMUM_SIZE);
    buf.extend_from_slice(serial.to_string().as_bytes());
    buf.push(DELIMITER);
    buf.extend_from_slice(tag.as_bytes());
    buf.push(DELIMITER);
    let room = PACKET_MAXIMUM_SIZE.saturating_sub(buf.len() + 1);
    let take = line.len().min(room);
    buf.extend_from_slice(&line[..take]);
    buf.push(0);
    buf
}

/// A decoded view over one log datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub serial: u64,
    pub tag: &'a [u8],
    pub line: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Split a datagram into its header and payload. Decoding is total:
    /// missing pieces come back empty and an unparseable serial becomes 0.
    #[must_use]
    pub fn parse(datagram: &'a [u8]) -> Frame<'a> {
        let end = datagram
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(datagram.len());
        let mut parts = datagram[..end].splitn(3, |&b| b == DELIMITER);
        let serial = parts
            .next()
            .and_then(|f| std::str::from_utf8(f).ok())
            .and_then(|f| f.parse().ok())
            .unwrap_or(0);
        let tag = parts.next().unwrap_or(b"");
        let line = parts.next().unwrap_or(b"");
        Frame { serial, tag, line }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{INPUT_BUFFER_SIZE, TAG_MAXIMUM_LENGTH};

    #[test]
    fn encode_matches_wire_layout() {
        let datagram = encode(1, "web", b"GET /x 200");
        assert_eq!(datagram, b"1\x1Eweb\x1EGET /x 200\x00");
    }

    #[test]
    fn empty_tag_keeps_both_delimiters() {
        let datagram = encode(7, "", b"line");
        assert_eq!(datagram, b"7\x1E\x1Eline\x00");
    }

    #[test]
    fn round_trip() {
        let line = b"GET\x1E200\x1E/a";
        let datagram = encode(42, "web", line);
        let frame = Frame::parse(&datagram);
        assert_eq!(frame.serial, 42);
        assert_eq!(frame.tag, b"web");
        assert_eq!(frame.line, line.as_slice());
    }

    #[test]
    fn oversize_payload_truncates_line_only() {
        let line = vec![b'x'; INPUT_BUFFER_SIZE + 100];
        let tag = "t".repeat(TAG_MAXIMUM_LENGTH);
        let datagram = encode(u64::MAX, &tag, &line);
        assert_eq!(datagram.len(), PACKET_MAXIMUM_SIZE);
        assert_eq!(*datagram.last().unwrap(), 0);
        let frame = Frame::parse(&datagram);
        assert_eq!(frame.serial, u64::MAX);
        assert_eq!(frame.tag, tag.as_bytes());
        assert!(frame.line.iter().all(|&b| b == b'x'));
    }

    #[test]
    fn worst_case_header_still_fits() {
        // 20-digit serial + 10-byte tag + 8191-byte payload is exactly the
        // maximum datagram.
        let line = vec![b'x'; INPUT_BUFFER_SIZE - 1];
        let datagram = encode(u64::MAX, "aaaaaaaaaa", &line);
        assert_eq!(datagram.len(), PACKET_MAXIMUM_SIZE);
        let frame = Frame::parse(&datagram);
        assert_eq!(frame.line.len(), INPUT_BUFFER_SIZE - 1);
    }

    #[test]
    fn parse_stops_at_first_nul() {
        let frame = Frame::parse(b"5\x1E\x1Eabc\x00def");
        assert_eq!(frame.line, b"abc");
    }

    #[test]
    fn parse_is_total_on_garbage() {
        let frame = Frame::parse(b"not a frame");
        assert_eq!(frame.serial, 0);
        assert_eq!(frame.tag, b"");
        assert_eq!(frame.line, b"");
    }
}
