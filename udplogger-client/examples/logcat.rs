// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Minimal receiver: prints every log datagram to stdout, prefixed with a
//! timestamp and the publisher endpoint, each separated by the wire
//! delimiter.
//!
//! ```text
//! logcat -o 127.0.0.1:43824
//! logcat            # discover publishers via interface broadcast
//! ```

use std::net::SocketAddr;

use chrono::Local;
use tracing_subscriber::EnvFilter;
use udplogger_client::{cli, LogHandler, Receiver};
use udplogger_wire::constants::DELIMITER;

struct Stdout;

impl LogHandler for Stdout {
    fn handle_packet(&mut self, source: SocketAddr, datagram: &[u8]) {
        let timestamp = Local::now().format("[%Y-%m-%d %H:%M:%S]");
        let delimiter = DELIMITER as char;
        println!(
            "{timestamp}{delimiter}[{source}]{delimiter}{}",
            String::from_utf8_lossy(datagram)
        );
    }

    fn shutdown(&mut self) {
        eprintln!("logcat: shutting down");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = cli::command("logcat")
        .about("Print udplogger datagrams to stdout.")
        .get_matches();
    let config = cli::config_from_matches(&matches)?;

    let receiver = Receiver::bind(config)?;
    receiver.run(&mut Stdout).await?;
    Ok(())
}
