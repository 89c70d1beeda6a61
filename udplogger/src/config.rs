// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Daemon configuration, immutable after startup.

use std::time::Duration;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use udplogger_wire::constants::{
    DEFAULT_MAXIMUM_TARGET_AGE_SECS, DEFAULT_PRUNE_TARGET_INTERVAL_SECS, DELIMITER,
    TAG_MAXIMUM_LENGTH, UDPLOGGER_DEFAULT_PORT,
};

use crate::errors::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port the daemon listens on for beacons and sends log datagrams from.
    pub listen_port: u16,
    /// How long a target stays in the table without a fresh beacon.
    pub maximum_target_age: Duration,
    /// Interval between prunes of the target table.
    pub prune_target_interval: Duration,
    /// Identifier stamped into every outgoing datagram; may be empty.
    pub tag: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: UDPLOGGER_DEFAULT_PORT,
            maximum_target_age: Duration::from_secs(DEFAULT_MAXIMUM_TARGET_AGE_SECS),
            prune_target_interval: Duration::from_secs(DEFAULT_PRUNE_TARGET_INTERVAL_SECS),
            tag: String::new(),
        }
    }
}

impl Config {
    /// The `udploggerd` command line. Help and version exit 0, argument
    /// errors exit non-zero, both before any I/O happens.
    pub fn command() -> Command {
        Command::new("udploggerd")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Reads log lines from stdin and ships them over UDP to every beaconing receiver.")
            .disable_version_flag(true)
            .arg(
                Arg::new("listen")
                    .short('l')
                    .long("listen")
                    .value_name("PORT")
                    .value_parser(value_parser!(u16).range(1..))
                    .default_value(UDPLOGGER_DEFAULT_PORT.to_string())
                    .help("listen for beacons on the given port"),
            )
            .arg(
                Arg::new("max_target_age")
                    .short('m')
                    .long("max_target_age")
                    .value_name("SECONDS")
                    .value_parser(value_parser!(u64).range(1..))
                    .default_value(DEFAULT_MAXIMUM_TARGET_AGE_SECS.to_string())
                    .help("expire log targets after this many seconds without a beacon"),
            )
            .arg(
                Arg::new("prune_target_interval")
                    .short('p')
                    .long("prune_target_interval")
                    .value_name("SECONDS")
                    .value_parser(value_parser!(u64).range(1..))
                    .default_value(DEFAULT_PRUNE_TARGET_INTERVAL_SECS.to_string())
                    .help("interval in seconds between prunes of the log target list"),
            )
            .arg(
                Arg::new("tag")
                    .short('t')
                    .long("tag")
                    .value_name("STRING")
                    .default_value("")
                    .help("tag the log lines with the given identification prefix"),
            )
            .arg(
                Arg::new("version")
                    .short('v')
                    .long("version")
                    .action(ArgAction::Version)
                    .help("display version and exit"),
            )
    }

    /// Build the configuration from parsed arguments.
    ///
    /// # Errors
    /// Fails if the tag exceeds [`TAG_MAXIMUM_LENGTH`] bytes or contains a
    /// byte that would corrupt the frame header.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ConfigError> {
        let tag = matches
            .get_one::<String>("tag")
            .cloned()
            .unwrap_or_default();
        if tag.len() > TAG_MAXIMUM_LENGTH {
            return Err(ConfigError::TagTooLong(tag));
        }
        if tag.bytes().any(|b| b == DELIMITER || b == 0) {
            return Err(ConfigError::TagNotFramable(tag));
        }
        #[allow(clippy::expect_used)]
        let listen_port = *matches.get_one::<u16>("listen").expect("defaulted");
        #[allow(clippy::expect_used)]
        let maximum_target_age =
            Duration::from_secs(*matches.get_one::<u64>("max_target_age").expect("defaulted"));
        #[allow(clippy::expect_used)]
        let prune_target_interval = Duration::from_secs(
            *matches
                .get_one::<u64>("prune_target_interval")
                .expect("defaulted"),
        );
        Ok(Self {
            listen_port,
            maximum_target_age,
            prune_target_interval,
            tag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, ConfigError> {
        let matches = Config::command()
            .try_get_matches_from(args)
            .expect("clap accepts arguments");
        Config::from_matches(&matches)
    }

    #[test]
    fn defaults_apply() {
        let config = parse(&["udploggerd"]).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn long_and_short_options_agree() {
        let long = parse(&[
            "udploggerd",
            "--listen",
            "55000",
            "--max_target_age",
            "60",
            "--prune_target_interval",
            "5",
            "--tag",
            "web",
        ])
        .unwrap();
        let short = parse(&[
            "udploggerd",
            "-l",
            "55000",
            "-m",
            "60",
            "-p",
            "5",
            "-t",
            "web",
        ])
        .unwrap();
        assert_eq!(long, short);
        assert_eq!(long.listen_port, 55000);
        assert_eq!(long.maximum_target_age, Duration::from_secs(60));
        assert_eq!(long.prune_target_interval, Duration::from_secs(5));
        assert_eq!(long.tag, "web");
    }

    #[test]
    fn oversize_tag_is_rejected() {
        assert_eq!(
            parse(&["udploggerd", "-t", "elevenbytes"]),
            Err(ConfigError::TagTooLong("elevenbytes".to_string()))
        );
    }

    #[test]
    fn tag_with_field_separator_is_rejected() {
        assert_eq!(
            parse(&["udploggerd", "-t", "a\u{1e}b"]),
            Err(ConfigError::TagNotFramable("a\u{1e}b".to_string()))
        );
    }

    #[test]
    fn maximum_length_tag_is_accepted() {
        assert_eq!(parse(&["udploggerd", "-t", "abcdefghij"]).unwrap().tag, "abcdefghij");
    }

    #[test]
    fn zero_and_garbage_ports_are_argument_errors() {
        assert!(Config::command()
            .try_get_matches_from(["udploggerd", "-l", "0"])
            .is_err());
        assert!(Config::command()
            .try_get_matches_from(["udploggerd", "-l", "notaport"])
            .is_err());
        assert!(Config::command()
            .try_get_matches_from(["udploggerd", "-m", "0"])
            .is_err());
    }
}
