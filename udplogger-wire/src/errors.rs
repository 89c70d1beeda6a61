// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for socket setup.

/// Failures from [`crate::socket::bind_udp`]. Creation and option errors are
/// kept apart from bind errors so callers can report a rejected port
/// distinctly from a broken socket layer.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// The kernel refused to create the UDP socket.
    #[error("udp socket creation failed: {0}")]
    Create(#[source] std::io::Error),
    /// Setting a socket option (address reuse, broadcast, non-blocking)
    /// failed.
    #[error("udp socket option failed: {0}")]
    Option(#[source] std::io::Error),
    /// The kernel rejected the bind.
    #[error("udp bind to port {port} failed: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}
