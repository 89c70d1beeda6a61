// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Receiver side of the udplogger fabric.
//!
//! A [`Receiver`] owns one UDP socket for its lifetime. It periodically
//! announces itself to every configured publisher with a beacon datagram and
//! hands every arriving log datagram to a caller-supplied [`LogHandler`].
//! Everything runs on a single cooperative loop, so a handler observes
//! beacons, datagrams and signals in one linear order and never runs
//! concurrently with the beacon emitter.

use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use udplogger_wire::beacon;
use udplogger_wire::constants::PACKET_MAXIMUM_SIZE;
use udplogger_wire::socket::bind_udp;

pub mod cli;
pub mod discovery;
pub mod errors;

use crate::errors::ClientError;

/// Per-packet hook implemented by client programs.
///
/// Handlers run synchronously inside the receive loop and must not block
/// indefinitely; a signal arriving while a handler runs is dispatched on the
/// next loop iteration, never dropped.
pub trait LogHandler: Send {
    /// Called once per received log datagram with the sender endpoint and
    /// the datagram bytes (truncated at the first NUL).
    fn handle_packet(&mut self, source: SocketAddr, datagram: &[u8]);

    /// Called on SIGHUP, e.g. to reopen an output file.
    fn reload(&mut self) {}

    /// Called once when the loop shuts down (SIGTERM or cancellation).
    fn shutdown(&mut self) {}
}

/// Receiver configuration, immutable after startup.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Seconds between beacon transmissions.
    pub beacon_interval: Duration,
    /// Publisher endpoints to announce to; never empty.
    pub publishers: Vec<SocketAddrV4>,
}

/// The receive loop: beacon emitter, datagram intake and signal dispatch.
pub struct Receiver {
    socket: Arc<UdpSocket>,
    config: ReceiverConfig,
    shutdown: CancellationToken,
}

impl Receiver {
    /// Bind the receiver's socket (ephemeral port, broadcast permitted).
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Fails if the publisher list is empty or the socket cannot be set up.
    pub fn bind(config: ReceiverConfig) -> Result<Self, ClientError> {
        if config.publishers.is_empty() {
            return Err(ClientError::NoPublishers);
        }
        let socket = Arc::new(UdpSocket::from_std(bind_udp(0)?)?);
        Ok(Self {
            socket,
            config,
            shutdown: CancellationToken::new(),
        })
    }

    /// The local endpoint beacons are sent from, i.e. the endpoint
    /// publishers will address datagrams to.
    ///
    /// # Errors
    /// Propagates the socket's own `local_addr` failure.
    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.socket.local_addr()?)
    }

    /// Token that stops [`Receiver::run`] from another task, equivalent to
    /// receiving SIGTERM.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run until SIGTERM (or cancellation). The first beacon burst goes out
    /// immediately so publishers pick the receiver up without waiting a full
    /// interval.
    ///
    /// # Errors
    /// Fails if the signal streams cannot be installed or the receive wait
    /// returns an unexpected error.
    pub async fn run<H: LogHandler>(&self, handler: &mut H) -> Result<(), ClientError> {
        let mut sigterm = signal(SignalKind::terminate()).map_err(ClientError::Signal)?;
        let mut sighup = signal(SignalKind::hangup()).map_err(ClientError::Signal)?;
        let mut beacon_tick = tokio::time::interval(self.config.beacon_interval);
        let mut buf = vec![0u8; PACKET_MAXIMUM_SIZE];

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    debug!("receiver cancelled");
                    handler.shutdown();
                    return Ok(());
                }
                _ = beacon_tick.tick() => self.send_beacons().await,
                received = self.socket.recv_from(&mut buf) => {
                    let (len, source) = received.map_err(ClientError::Receive)?;
                    // A malformed datagram may lack the trailing NUL; a
                    // truncated one may carry bytes past it. Hand the
                    // handler exactly the NUL-delimited payload.
                    let datagram = buf[..len]
                        .split(|&b| b == 0)
                        .next()
                        .unwrap_or(&[]);
                    handler.handle_packet(source, datagram);
                }
                _ = sigterm.recv() => {
                    debug!("TERM received, shutting down");
                    handler.shutdown();
                    return Ok(());
                }
                _ = sighup.recv() => {
                    debug!("HUP received, invoking reload hook");
                    handler.reload();
                }
            }
        }
    }

    async fn send_beacons(&self) {
        let packet = beacon::packet();
        for publisher in &self.config.publishers {
            if let Err(err) = self.socket.send_to(&packet, *publisher).await {
                warn!(%publisher, %err, "beacon send failed");
            }
        }
    }
}
