// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! UDP socket setup shared by the publisher and the client library.

use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::debug;

use crate::errors::SocketError;

/// Create a UDP/IPv4 socket bound to `0.0.0.0:port` with `SO_REUSEADDR` and
/// `SO_BROADCAST` set. `port = 0` binds an ephemeral port.
///
/// The returned socket is non-blocking so it can be handed straight to an
/// async runtime (`tokio::net::UdpSocket::from_std`). There are no retries:
/// a rejected bind surfaces as [`SocketError::Bind`], everything else as
/// creation or option errors.
pub fn bind_udp(port: u16) -> Result<UdpSocket, SocketError> {
    let socket =
        Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(SocketError::Create)?;
    socket.set_reuse_address(true).map_err(SocketError::Option)?;
    socket.set_broadcast(true).map_err(SocketError::Option)?;
    socket.set_nonblocking(true).map_err(SocketError::Option)?;
    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    socket
        .bind(&addr.into())
        .map_err(|source| SocketError::Bind { port, source })?;
    let socket: UdpSocket = socket.into();
    debug!(?port, local_addr = ?socket.local_addr().ok(), "bound udp socket");
    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_bind_succeeds() {
        let socket = bind_udp(0).expect("bind to ephemeral port");
        let addr = socket.local_addr().unwrap();
        assert!(addr.port() != 0);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn same_port_can_be_rebound_with_reuseaddr() {
        let first = bind_udp(0).unwrap();
        let port = match first.local_addr().unwrap() {
            std::net::SocketAddr::V4(v4) => v4.port(),
            other => panic!("expected v4 addr, got {other}"),
        };
        bind_udp(port).expect("SO_REUSEADDR allows a second bind");
    }

    #[test]
    fn broadcast_is_enabled() {
        let socket = bind_udp(0).unwrap();
        assert!(socket.broadcast().unwrap());
    }
}
