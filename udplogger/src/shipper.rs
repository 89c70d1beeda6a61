// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The stdin ingest and fan-out loop.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::net::UdpSocket;
use tracing::warn;
use udplogger_wire::constants::INPUT_BUFFER_SIZE;
use udplogger_wire::frame;
use udplogger_wire::trim::trim_trailing_whitespace;

use crate::targets::TargetTable;

/// Reads log lines from `reader`, frames each one and sends it to every
/// target currently in the table. Returns when the reader reaches end of
/// stream.
pub struct Shipper<R> {
    reader: R,
    socket: Arc<UdpSocket>,
    targets: Arc<TargetTable>,
    tag: String,
    serial: u64,
}

impl<R: AsyncBufRead + Unpin> Shipper<R> {
    pub fn new(reader: R, socket: Arc<UdpSocket>, targets: Arc<TargetTable>, tag: String) -> Self {
        Self {
            reader,
            socket,
            targets,
            tag,
            serial: 0,
        }
    }

    /// The serial stamped into the most recent line; 0 before the first.
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Run until end of input.
    ///
    /// Every line advances the serial, even when the target table looks
    /// empty and framing is skipped. The emptiness check deliberately runs
    /// without the table lock; it can skip at most a handful of lines right
    /// after the very first beacon, which a best-effort shipper tolerates.
    ///
    /// # Errors
    /// Only reader errors abort the loop. A failed send is logged and the
    /// remaining targets still get the datagram.
    pub async fn run(&mut self) -> io::Result<()> {
        let mut line = Vec::with_capacity(INPUT_BUFFER_SIZE);
        loop {
            line.clear();
            if read_line_bounded(&mut self.reader, &mut line, INPUT_BUFFER_SIZE - 1).await? == 0 {
                return Ok(());
            }
            self.serial = self.serial.wrapping_add(1);

            if self.targets.is_empty() {
                continue;
            }

            trim_trailing_whitespace(&mut line);
            let datagram = frame::encode(self.serial, &self.tag, &line);
            for target in self.targets.snapshot() {
                if let Err(err) = self.socket.send_to(&datagram, target).await {
                    warn!(%target, %err, "send failed, skipping target");
                }
            }
        }
    }
}

/// Read one line (including its newline) into `line`, up to `max` bytes.
/// A longer line is split: the remainder becomes the next line. Returns the
/// number of bytes read, 0 at end of stream.
async fn read_line_bounded<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    line: &mut Vec<u8>,
    max: usize,
) -> io::Result<usize> {
    loop {
        let (consumed, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(line.len());
            }
            let room = max - line.len();
            match available.iter().take(room).position(|&b| b == b'\n') {
                Some(newline) => {
                    line.extend_from_slice(&available[..=newline]);
                    (newline + 1, true)
                }
                None => {
                    let take = available.len().min(room);
                    line.extend_from_slice(&available[..take]);
                    (take, line.len() == max)
                }
            }
        };
        reader.consume(consumed);
        if done {
            return Ok(line.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read_all_lines(mut input: &[u8], max: usize) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        loop {
            let mut line = Vec::new();
            if read_line_bounded(&mut input, &mut line, max).await.unwrap() == 0 {
                return lines;
            }
            lines.push(line);
        }
    }

    #[tokio::test]
    async fn splits_on_newlines() {
        let lines = read_all_lines(b"one\ntwo\nthree\n", 128).await;
        assert_eq!(lines, vec![b"one\n".to_vec(), b"two\n".to_vec(), b"three\n".to_vec()]);
    }

    #[tokio::test]
    async fn final_unterminated_line_is_returned() {
        let lines = read_all_lines(b"one\ntwo", 128).await;
        assert_eq!(lines, vec![b"one\n".to_vec(), b"two".to_vec()]);
    }

    #[tokio::test]
    async fn overlong_line_is_split_at_the_buffer_bound() {
        let lines = read_all_lines(b"aaaaaaaabb\n", 8).await;
        assert_eq!(lines, vec![b"aaaaaaaa".to_vec(), b"bb\n".to_vec()]);
    }
}
