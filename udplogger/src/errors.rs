// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for the publisher daemon.

use udplogger_wire::constants::TAG_MAXIMUM_LENGTH;

/// Failures while building the daemon configuration from command-line
/// arguments; reported before any socket is opened.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The tag does not fit its fixed-size field in the frame header.
    #[error("tag '{0}' is too long, maximum length is {TAG_MAXIMUM_LENGTH} bytes")]
    TagTooLong(String),
    /// The tag would corrupt the frame layout.
    #[error("tag '{0}' contains a field separator or NUL byte")]
    TagNotFramable(String),
}
