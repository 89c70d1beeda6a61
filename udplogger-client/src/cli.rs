// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Command-line plumbing shared by client programs.
//!
//! The library contributes the options every receiver understands
//! (`-o/--host`, `-i/--interval`, `-h/--help`, `-v/--version`); a client
//! program extends the returned [`Command`] with its own arguments before
//! parsing:
//!
//! ```no_run
//! let matches = udplogger_client::cli::command("logcat")
//!     .arg(clap::Arg::new("file").short('f').long("file"))
//!     .get_matches();
//! let config = udplogger_client::cli::config_from_matches(&matches)?;
//! # Ok::<(), udplogger_client::errors::ClientError>(())
//! ```

use std::net::{SocketAddr, SocketAddrV4, ToSocketAddrs};
use std::time::Duration;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use udplogger_wire::constants::{DEFAULT_BEACON_INTERVAL_SECS, UDPLOGGER_DEFAULT_PORT};

use crate::discovery;
use crate::errors::ClientError;
use crate::ReceiverConfig;

/// Base command for a receiver program named `name`.
pub fn command(name: &'static str) -> Command {
    Command::new(name)
        .version(env!("CARGO_PKG_VERSION"))
        .disable_version_flag(true)
        .arg(
            Arg::new("host")
                .short('o')
                .long("host")
                .value_name("HOST[:PORT]")
                .action(ArgAction::Append)
                .help("host and port to target with beacon transmissions (default broadcast)"),
        )
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .value_name("SECONDS")
                .value_parser(value_parser!(u64).range(1..))
                .default_value(DEFAULT_BEACON_INTERVAL_SECS.to_string())
                .help("interval in seconds between beacon transmissions"),
        )
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::Version)
                .help("display version and exit"),
        )
}

/// Build the receiver configuration from parsed arguments. Without any
/// `-o/--host`, the publisher list falls back to the broadcast address of
/// every eligible interface.
///
/// # Errors
/// Fails on a malformed or unresolvable host specification, and when the
/// final publisher list comes up empty.
pub fn config_from_matches(matches: &ArgMatches) -> Result<ReceiverConfig, ClientError> {
    #[allow(clippy::expect_used)]
    let beacon_interval =
        Duration::from_secs(*matches.get_one::<u64>("interval").expect("defaulted"));

    let mut publishers = Vec::new();
    match matches.get_many::<String>("host") {
        Some(specs) => {
            for spec in specs {
                publishers.extend(resolve_host_spec(spec)?);
            }
        }
        None => publishers = discovery::broadcast_addresses(UDPLOGGER_DEFAULT_PORT)?,
    }
    if publishers.is_empty() {
        return Err(ClientError::NoPublishers);
    }

    Ok(ReceiverConfig {
        beacon_interval,
        publishers,
    })
}

/// Resolve one `HOST[:PORT]` specification to its IPv4 endpoints. Without a
/// port the default publisher port applies; port 0 is rejected.
///
/// # Errors
/// Fails on an empty host, an unparseable port, or a name that does not
/// resolve.
pub fn resolve_host_spec(spec: &str) -> Result<Vec<SocketAddrV4>, ClientError> {
    let (host, port) = match spec.split_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .ok()
                .filter(|&p| p != 0)
                .ok_or_else(|| ClientError::InvalidHost(spec.to_string()))?;
            (host, port)
        }
        None => (spec, UDPLOGGER_DEFAULT_PORT),
    };
    if host.is_empty() {
        return Err(ClientError::InvalidHost(spec.to_string()));
    }

    let resolved = (host, port)
        .to_socket_addrs()
        .map_err(|source| ClientError::Resolve {
            spec: spec.to_string(),
            source,
        })?;
    Ok(resolved
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        })
        .collect())
}
