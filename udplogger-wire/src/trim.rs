// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-place removal of trailing whitespace from log lines.

/// Shrink `buf` to its longest prefix whose final byte is not ASCII
/// whitespace and return the resulting length.
pub fn trim_trailing_whitespace(buf: &mut Vec<u8>) -> usize {
    let end = buf
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    buf.truncate(end);
    end
}
