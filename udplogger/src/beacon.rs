// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Background intake of receiver beacons.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use udplogger_wire::beacon;
use udplogger_wire::constants::BEACON_PACKET_SIZE;

use crate::targets::TargetTable;

/// Listens for beacon datagrams on the daemon's shared socket and maintains
/// the target table.
///
/// The receive wait is bounded by the prune interval, so the table is pruned
/// on every wakeup whether or not a datagram arrived: the prune interval is
/// a ceiling on how long an expired target may linger, and a busy beacon
/// stream only prunes more often.
pub struct BeaconListener {
    socket: Arc<UdpSocket>,
    targets: Arc<TargetTable>,
    maximum_target_age: Duration,
    prune_target_interval: Duration,
    shutdown: CancellationToken,
}

impl BeaconListener {
    pub fn new(
        socket: Arc<UdpSocket>,
        targets: Arc<TargetTable>,
        maximum_target_age: Duration,
        prune_target_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            socket,
            targets,
            maximum_target_age,
            prune_target_interval,
            shutdown,
        }
    }

    /// Main worker loop; runs until cancelled or a fatal receive error.
    pub async fn run(&mut self) {
        let mut buf = [0u8; BEACON_PACKET_SIZE];
        loop {
            let wakeup = tokio::select! {
                () = self.shutdown.cancelled() => return,
                received = tokio::time::timeout(
                    self.prune_target_interval,
                    self.socket.recv_from(&mut buf),
                ) => received,
            };
            match wakeup {
                Ok(Ok((len, SocketAddr::V4(source)))) => {
                    if beacon::matches(&buf[..len]) {
                        debug!(%source, "beacon received");
                        self.targets.upsert(source, Instant::now());
                    } else {
                        debug!(%source, "dropping non-beacon datagram");
                    }
                }
                Ok(Ok((_, source))) => {
                    debug!(%source, "dropping beacon from non-ipv4 source");
                }
                Ok(Err(err)) => {
                    // Fatal to this worker only: the ingest loop keeps
                    // running without discovery.
                    error!(%err, "beacon receive failed, stopping target discovery");
                    return;
                }
                Err(_elapsed) => {}
            }
            self.targets.prune(Instant::now(), self.maximum_target_age);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn bound_socket() -> Arc<UdpSocket> {
        Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap())
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn beacon_registers_its_source() {
        let socket = bound_socket().await;
        let daemon_addr = socket.local_addr().unwrap();
        let targets = Arc::new(TargetTable::new());
        let shutdown = CancellationToken::new();
        let mut listener = BeaconListener::new(
            Arc::clone(&socket),
            Arc::clone(&targets),
            Duration::from_secs(120),
            Duration::from_millis(50),
            shutdown.clone(),
        );
        let handle = tokio::spawn(async move { listener.run().await });

        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        receiver
            .send_to(&beacon::packet(), daemon_addr)
            .await
            .unwrap();

        wait_for(|| targets.len() == 1).await;
        let expected = match receiver.local_addr().unwrap() {
            SocketAddr::V4(v4) => v4,
            other => panic!("expected v4 addr, got {other}"),
        };
        assert_eq!(targets.snapshot(), vec![expected]);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn non_beacon_datagrams_are_dropped() {
        let socket = bound_socket().await;
        let daemon_addr = socket.local_addr().unwrap();
        let targets = Arc::new(TargetTable::new());
        let shutdown = CancellationToken::new();
        let mut listener = BeaconListener::new(
            Arc::clone(&socket),
            Arc::clone(&targets),
            Duration::from_secs(120),
            Duration::from_millis(20),
            shutdown.clone(),
        );
        let handle = tokio::spawn(async move { listener.run().await });

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut bogus = [0u8; BEACON_PACKET_SIZE];
        bogus[..5].copy_from_slice(b"HELLO");
        sender.send_to(&bogus, daemon_addr).await.unwrap();
        // A genuine beacon afterwards proves the bogus one was processed and
        // dropped rather than still queued.
        sender.send_to(&beacon::packet(), daemon_addr).await.unwrap();

        wait_for(|| targets.len() == 1).await;
        assert_eq!(targets.len(), 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn expired_target_is_pruned_within_the_cadence() {
        let socket = bound_socket().await;
        let daemon_addr = socket.local_addr().unwrap();
        let targets = Arc::new(TargetTable::new());
        let shutdown = CancellationToken::new();
        let mut listener = BeaconListener::new(
            Arc::clone(&socket),
            Arc::clone(&targets),
            Duration::from_millis(50),
            Duration::from_millis(20),
            shutdown.clone(),
        );
        let handle = tokio::spawn(async move { listener.run().await });

        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        receiver
            .send_to(&beacon::packet(), daemon_addr)
            .await
            .unwrap();
        wait_for(|| targets.len() == 1).await;
        wait_for(|| targets.is_empty()).await;

        shutdown.cancel();
        handle.await.unwrap();
    }
}
