// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for the receiver library.

use udplogger_wire::errors::SocketError;

/// Failures while configuring or running a [`crate::Receiver`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No `-o/--host` was given and interface discovery yielded nothing.
    #[error("no publisher endpoints configured and none discovered")]
    NoPublishers,
    /// A `HOST[:PORT]` argument that could not be understood.
    #[error("invalid host specification '{0}'")]
    InvalidHost(String),
    /// A host name that did not resolve.
    #[error("could not resolve host '{spec}': {source}")]
    Resolve {
        spec: String,
        #[source]
        source: std::io::Error,
    },
    /// Interface enumeration for broadcast discovery failed.
    #[error("interface enumeration failed: {0}")]
    Discovery(#[source] nix::Error),
    /// Socket setup failed.
    #[error(transparent)]
    Socket(#[from] SocketError),
    /// Installing the TERM/HUP signal streams failed.
    #[error("signal handler installation failed: {0}")]
    Signal(#[source] std::io::Error),
    /// The receive wait returned an unexpected error.
    #[error("datagram receive failed: {0}")]
    Receive(#[source] std::io::Error),
    /// Registering the socket with the async runtime failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
