// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tokio::io::BufReader;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use udplogger::beacon::BeaconListener;
use udplogger::config::Config;
use udplogger::shipper::Shipper;
use udplogger::targets::TargetTable;
use udplogger_wire::socket::bind_udp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Config::command().get_matches();
    let config = Config::from_matches(&matches).unwrap_or_else(|err| {
        eprintln!("udploggerd: {err}");
        std::process::exit(2);
    });

    // Diagnostics go to stderr; stdout is never written so the daemon can
    // sit at the end of an access-log pipe.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    debug!(?config, "starting udploggerd");

    let socket = Arc::new(UdpSocket::from_std(bind_udp(config.listen_port)?)?);
    let targets = Arc::new(TargetTable::new());

    let shutdown = CancellationToken::new();
    let mut listener = BeaconListener::new(
        Arc::clone(&socket),
        Arc::clone(&targets),
        config.maximum_target_age,
        config.prune_target_interval,
        shutdown.clone(),
    );
    tokio::spawn(async move { listener.run().await });

    let mut shipper = Shipper::new(
        BufReader::new(tokio::io::stdin()),
        socket,
        targets,
        config.tag,
    );
    shipper.run().await?;

    // End of stream on stdin is the normal exit; the beacon worker is not
    // joined, process teardown reclaims it.
    Ok(())
}
