// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::timeout;

use udplogger_client::{LogHandler, Receiver, ReceiverConfig};
use udplogger_wire::{beacon, frame};

#[derive(Debug, PartialEq, Eq)]
enum Event {
    Packet(SocketAddr, Vec<u8>),
    Reload,
    Shutdown,
}

struct ChannelHandler {
    events: mpsc::UnboundedSender<Event>,
}

impl LogHandler for ChannelHandler {
    fn handle_packet(&mut self, source: SocketAddr, datagram: &[u8]) {
        let _ = self.events.send(Event::Packet(source, datagram.to_vec()));
    }

    fn reload(&mut self) {
        let _ = self.events.send(Event::Reload);
    }

    fn shutdown(&mut self) {
        let _ = self.events.send(Event::Shutdown);
    }
}

fn loopback(port: u16) -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), port)
}

#[tokio::test]
async fn beacons_immediately_and_delivers_datagrams_until_cancelled() {
    let publisher = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let publisher_port = match publisher.local_addr().unwrap() {
        SocketAddr::V4(addr) => addr.port(),
        other => panic!("expected v4, got {other}"),
    };

    let receiver = Receiver::bind(ReceiverConfig {
        beacon_interval: Duration::from_secs(30),
        publishers: vec![loopback(publisher_port)],
    })
    .unwrap();
    let receiver_port = receiver.local_addr().unwrap().port();
    let cancel = receiver.cancellation_token();

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let run = tokio::spawn(async move {
        let mut handler = ChannelHandler { events: events_tx };
        receiver.run(&mut handler).await
    });

    // The first beacon goes out immediately, well within one interval.
    let mut buf = [0u8; 64];
    let (len, from) = timeout(Duration::from_secs(1), publisher.recv_from(&mut buf))
        .await
        .expect("beacon within a second")
        .unwrap();
    assert!(beacon::matches(&buf[..len]));
    assert_eq!(from, SocketAddr::V4(loopback(receiver_port)));

    // The publisher answers with a log datagram; the handler sees it with
    // the trailing NUL stripped.
    let datagram = frame::encode(1, "web", b"GET /x 200");
    publisher
        .send_to(&datagram, loopback(receiver_port))
        .await
        .unwrap();
    match timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("packet within a second")
        .unwrap()
    {
        Event::Packet(source, payload) => {
            assert_eq!(source, SocketAddr::V4(loopback(publisher_port)));
            assert_eq!(payload, datagram[..datagram.len() - 1].to_vec());
        }
        other => panic!("expected packet event, got {other:?}"),
    }

    // Cancellation behaves like TERM: shutdown hook, then a clean exit.
    cancel.cancel();
    assert_eq!(
        timeout(Duration::from_secs(1), events.recv()).await.unwrap(),
        Some(Event::Shutdown)
    );
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn beacons_every_interval_to_all_publishers() {
    let first = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let second = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port_of = |socket: &UdpSocket| match socket.local_addr().unwrap() {
        SocketAddr::V4(addr) => addr.port(),
        other => panic!("expected v4, got {other}"),
    };

    let receiver = Receiver::bind(ReceiverConfig {
        beacon_interval: Duration::from_millis(50),
        publishers: vec![loopback(port_of(&first)), loopback(port_of(&second))],
    })
    .unwrap();
    let cancel = receiver.cancellation_token();
    let run = tokio::spawn(async move {
        let mut handler = ChannelHandler {
            events: mpsc::unbounded_channel().0,
        };
        receiver.run(&mut handler).await
    });

    for publisher in [&first, &second] {
        for _ in 0..3 {
            let mut buf = [0u8; 64];
            let (len, _) = timeout(Duration::from_secs(1), publisher.recv_from(&mut buf))
                .await
                .expect("repeated beacons")
                .unwrap();
            assert!(beacon::matches(&buf[..len]));
        }
    }

    cancel.cancel();
    run.await.unwrap().unwrap();
}

#[test]
fn empty_publisher_list_is_rejected() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        let result = Receiver::bind(ReceiverConfig {
            beacon_interval: Duration::from_secs(30),
            publishers: Vec::new(),
        });
        assert!(matches!(
            result,
            Err(udplogger_client::errors::ClientError::NoPublishers)
        ));
    });
}
