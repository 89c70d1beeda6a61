// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Protocol constants shared by every udplogger component.

/// Size in bytes of a beacon datagram. Beacons shorter than this are padded
/// with NUL bytes on send; bytes past the identifier are ignored on receive.
pub const BEACON_PACKET_SIZE: usize = 32;

/// Identifier carried in the leading bytes of every beacon datagram.
pub const BEACON_IDENTIFIER: &[u8] = b"UDPLOGGER BEACON";

/// The maximum length of a single log line (as read from stdin).
pub const INPUT_BUFFER_SIZE: usize = 1024 * 8;

/// Byte used to delimit the fields of a log datagram (ASCII unit separator).
pub const DELIMITER: u8 = 0x1E;

/// The maximum length in bytes of a publisher tag.
pub const TAG_MAXIMUM_LENGTH: usize = 10;

/// Log packet format is:                   [serial]   [tag]                    [log data].
pub const PACKET_MAXIMUM_SIZE: usize = (20 + 1) + (TAG_MAXIMUM_LENGTH + 1) + INPUT_BUFFER_SIZE;

/// The default port that udplogger components use to communicate.
pub const UDPLOGGER_DEFAULT_PORT: u16 = 43824;

/// Default number of seconds a publisher keeps a target alive without a
/// fresh beacon.
pub const DEFAULT_MAXIMUM_TARGET_AGE_SECS: u64 = 120;

/// Default number of seconds between prunes of the publisher target table.
pub const DEFAULT_PRUNE_TARGET_INTERVAL_SECS: u64 = 10;

/// Default number of seconds between beacon transmissions on the client side.
pub const DEFAULT_BEACON_INTERVAL_SECS: u64 = 30;
