// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Beacon datagram construction and recognition.

use crate::constants::{BEACON_IDENTIFIER, BEACON_PACKET_SIZE};

/// Build the 32-byte beacon payload: the identifier string followed by NUL
/// padding. The padding bytes are reserved and carry no meaning.
#[must_use]
pub fn packet() -> [u8; BEACON_PACKET_SIZE] {
    let mut buf = [0u8; BEACON_PACKET_SIZE];
    buf[..BEACON_IDENTIFIER.len()].copy_from_slice(BEACON_IDENTIFIER);
    buf
}

/// Whether a received datagram is a beacon. Only the leading identifier
/// bytes are inspected; anything after them is ignored.
#[must_use]
pub fn matches(data: &[u8]) -> bool {
    data.len() >= BEACON_IDENTIFIER.len() && &data[..BEACON_IDENTIFIER.len()] == BEACON_IDENTIFIER
}
