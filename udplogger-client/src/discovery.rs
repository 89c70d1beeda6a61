// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Enumeration of the host's IPv4 broadcast addresses.
//!
//! Used when a client is started without explicit publisher endpoints: the
//! beacon is then sent to the broadcast address of every eligible interface
//! so any publisher on the local segments picks the client up.

use std::net::{Ipv4Addr, SocketAddrV4};

use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;
use nix::sys::socket::SockaddrStorage;
use tracing::debug;

use crate::errors::ClientError;

/// Collect the broadcast address of every eligible interface, paired with
/// `port`. Eligible means: up, not loopback, not point-to-point, broadcast
/// capable, and carrying an IPv4 broadcast address other than `0.0.0.0`.
pub fn broadcast_addresses(port: u16) -> Result<Vec<SocketAddrV4>, ClientError> {
    let mut found = Vec::new();
    for ifaddr in getifaddrs().map_err(ClientError::Discovery)? {
        if let Some(broadcast) = eligible_broadcast(ifaddr.flags, ifaddr.broadcast.as_ref()) {
            debug!(interface = %ifaddr.interface_name, %broadcast, "discovered broadcast address");
            found.push(SocketAddrV4::new(broadcast, port));
        }
    }
    Ok(found)
}

fn eligible_broadcast(
    flags: InterfaceFlags,
    broadcast: Option<&SockaddrStorage>,
) -> Option<Ipv4Addr> {
    if !flags.contains(InterfaceFlags::IFF_UP) {
        return None;
    }
    if flags.intersects(InterfaceFlags::IFF_LOOPBACK | InterfaceFlags::IFF_POINTOPOINT) {
        return None;
    }
    if !flags.contains(InterfaceFlags::IFF_BROADCAST) {
        return None;
    }
    let address = broadcast?.as_sockaddr_in()?.ip();
    if address.is_unspecified() {
        return None;
    }
    Some(address)
}
