// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The structured projection of a log datagram.
//!
//! Splitting on the 0x1E unit separator yields an ordered field list which
//! is mapped positionally onto [`LogEntry`]. The projection is total: a
//! field that fails to parse takes its documented default (zero, `Unknown`,
//! or empty) instead of failing the whole line.
//!
//! Two schemas exist on the wire. Version 1 is assumed unless the first
//! field after the base header is the literal `v2` (case-insensitive), which
//! inserts a `host` field after the remote address and a `content_type`
//! field after the referer.

use std::borrow::Cow;
use std::net::Ipv4Addr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::DELIMITER;

/// Placeholder the web server emits for a field it has no value for.
pub const UNSET_FIELD: &str = "-";

const TIMESTAMP_FORMAT: &str = "[%Y-%m-%d %H:%M:%S]";

/// HTTP request method of a log entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMethod {
    #[default]
    Unknown,
    Options,
    Get,
    Head,
    Post,
    Put,
    Delete,
    Trace,
    Connect,
}

impl RequestMethod {
    /// Case-insensitive mapping from the wire spelling; anything unmapped
    /// becomes [`RequestMethod::Unknown`].
    #[must_use]
    pub fn parse(field: &str) -> Self {
        match field.to_ascii_lowercase().as_str() {
            "options" => Self::Options,
            "get" => Self::Get,
            "head" => Self::Head,
            "post" => Self::Post,
            "put" => Self::Put,
            "delete" => Self::Delete,
            "trace" => Self::Trace,
            "connect" => Self::Connect,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Options => "OPTIONS",
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Trace => "TRACE",
            Self::Connect => "CONNECT",
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the client connection after the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Aborted,
    KeepAlive,
    Close,
}

impl ConnectionStatus {
    #[must_use]
    pub fn parse(field: &str) -> Self {
        match field {
            "X" | "x" => Self::Aborted,
            "+" => Self::KeepAlive,
            "-" => Self::Close,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Aborted => "X",
            Self::KeepAlive => "+",
            Self::Close => "-",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-reported sex of the authenticated site user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSex {
    #[default]
    Unknown,
    Male,
    Female,
}

impl UserSex {
    #[must_use]
    pub fn parse(field: &str) -> Self {
        match field.to_ascii_lowercase().as_str() {
            "male" => Self::Male,
            "female" => Self::Female,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl std::fmt::Display for UserSex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account class of the authenticated site user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    Unknown,
    Plus,
    User,
    Anon,
}

impl UserType {
    #[must_use]
    pub fn parse(field: &str) -> Self {
        match field.to_ascii_lowercase().as_str() {
            "plus" => Self::Plus,
            "user" => Self::User,
            "anon" => Self::Anon,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Plus => "plus",
            Self::User => "user",
            Self::Anon => "anon",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed log line.
///
/// Unset string fields (the web server writes the literal `-`) come back as
/// the empty string. `timestamp`, `source_address` and `source_port` are
/// only populated when parsing a logged line (the form a tee-style consumer
/// writes to disk, prefixed with `[timestamp]` and `[ip:port]`); datagrams
/// straight off the wire leave them at their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: Option<NaiveDateTime>,
    pub source_address: Ipv4Addr,
    pub source_port: u16,
    pub serial: u64,
    pub tag: String,
    pub version: u16,
    pub method: RequestMethod,
    pub status: u16,
    pub body_size: u32,
    pub bytes_incoming: u32,
    pub bytes_outgoing: u32,
    pub time_used: u16,
    pub connection_status: ConnectionStatus,
    pub request_url: String,
    pub query_string: String,
    pub remote_address: Ipv4Addr,
    pub host: String,
    pub user_agent: String,
    pub forwarded_for: String,
    pub referer: String,
    pub content_type: String,
    pub user_id: u64,
    pub user_age: u16,
    pub user_sex: UserSex,
    pub user_location: u64,
    pub user_type: UserType,
    /// The raw, unmodified line the entry was parsed from.
    pub raw: String,
}

impl Default for LogEntry {
    fn default() -> Self {
        Self {
            timestamp: None,
            source_address: Ipv4Addr::UNSPECIFIED,
            source_port: 0,
            serial: 0,
            tag: String::new(),
            version: 0,
            method: RequestMethod::default(),
            status: 0,
            body_size: 0,
            bytes_incoming: 0,
            bytes_outgoing: 0,
            time_used: 0,
            connection_status: ConnectionStatus::default(),
            request_url: String::new(),
            query_string: String::new(),
            remote_address: Ipv4Addr::UNSPECIFIED,
            host: String::new(),
            user_agent: String::new(),
            forwarded_for: String::new(),
            referer: String::new(),
            content_type: String::new(),
            user_id: 0,
            user_age: 0,
            user_sex: UserSex::default(),
            user_location: 0,
            user_type: UserType::default(),
            raw: String::new(),
        }
    }
}

/// One position in a field schema. Each variant knows how to fold its wire
/// field into the entry, so a schema is just an ordered list of variants and
/// schema changes stay local to the lists below.
#[derive(Debug, Clone, Copy)]
enum Field {
    Timestamp,
    Source,
    Serial,
    Tag,
    Version,
    Method,
    Status,
    BodySize,
    BytesIncoming,
    BytesOutgoing,
    TimeUsed,
    ConnectionStatus,
    RequestUrl,
    QueryString,
    RemoteAddress,
    Host,
    UserAgent,
    ForwardedFor,
    Referer,
    ContentType,
    UserId,
    UserAge,
    UserSex,
    UserLocation,
    UserType,
}

/// Base header of a datagram straight off the wire.
const BASE_DATAGRAM: &[Field] = &[Field::Serial, Field::Tag];

/// Base header of a line written to disk by a tee-style consumer.
const BASE_LOGGED: &[Field] = &[Field::Timestamp, Field::Source, Field::Serial, Field::Tag];

const FIELDS_V1: &[Field] = &[
    Field::Method,
    Field::Status,
    Field::BodySize,
    Field::BytesIncoming,
    Field::BytesOutgoing,
    Field::TimeUsed,
    Field::ConnectionStatus,
    Field::RequestUrl,
    Field::QueryString,
    Field::RemoteAddress,
    Field::UserAgent,
    Field::ForwardedFor,
    Field::Referer,
    Field::UserId,
    Field::UserAge,
    Field::UserSex,
    Field::UserLocation,
    Field::UserType,
];

const FIELDS_V2: &[Field] = &[
    Field::Version,
    Field::Method,
    Field::Status,
    Field::BodySize,
    Field::BytesIncoming,
    Field::BytesOutgoing,
    Field::TimeUsed,
    Field::ConnectionStatus,
    Field::RequestUrl,
    Field::QueryString,
    Field::RemoteAddress,
    Field::Host,
    Field::UserAgent,
    Field::ForwardedFor,
    Field::Referer,
    Field::ContentType,
    Field::UserId,
    Field::UserAge,
    Field::UserSex,
    Field::UserLocation,
    Field::UserType,
];

impl Field {
    fn apply(self, entry: &mut LogEntry, field: &str) {
        match self {
            Field::Timestamp => {
                entry.timestamp = NaiveDateTime::parse_from_str(field, TIMESTAMP_FORMAT).ok();
            }
            Field::Source => (entry.source_address, entry.source_port) = parse_source(field),
            Field::Serial => entry.serial = parse_int(field),
            Field::Tag => entry.tag = field.to_owned(),
            Field::Version => {
                entry.version = field
                    .strip_prefix(['v', 'V'])
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
            }
            Field::Method => entry.method = RequestMethod::parse(field),
            Field::Status => entry.status = parse_int(field),
            Field::BodySize => entry.body_size = parse_int(field),
            Field::BytesIncoming => entry.bytes_incoming = parse_int(field),
            Field::BytesOutgoing => entry.bytes_outgoing = parse_int(field),
            Field::TimeUsed => entry.time_used = parse_int(field),
            Field::ConnectionStatus => entry.connection_status = ConnectionStatus::parse(field),
            Field::RequestUrl => entry.request_url = parse_string(field),
            Field::QueryString => entry.query_string = parse_string(field),
            Field::RemoteAddress => entry.remote_address = parse_ipv4(field),
            Field::Host => entry.host = parse_string(field),
            Field::UserAgent => entry.user_agent = parse_string(field),
            Field::ForwardedFor => entry.forwarded_for = parse_string(field),
            Field::Referer => entry.referer = parse_string(field),
            Field::ContentType => entry.content_type = parse_string(field),
            Field::UserId => entry.user_id = parse_int(field),
            Field::UserAge => entry.user_age = parse_int(field),
            Field::UserSex => entry.user_sex = UserSex::parse(field),
            Field::UserLocation => entry.user_location = parse_int(field),
            Field::UserType => entry.user_type = UserType::parse(field),
        }
    }
}

fn parse_int<T: std::str::FromStr + Default>(field: &str) -> T {
    field.parse().unwrap_or_default()
}

fn parse_string(field: &str) -> String {
    if field == UNSET_FIELD {
        String::new()
    } else {
        field.to_owned()
    }
}

fn parse_ipv4(field: &str) -> Ipv4Addr {
    field.parse().unwrap_or(Ipv4Addr::UNSPECIFIED)
}

/// Parse a `[<ipv4>:<port>]` source field. Either component may be absent,
/// in which case it stays zero.
fn parse_source(field: &str) -> (Ipv4Addr, u16) {
    let Some(inner) = field
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return (Ipv4Addr::UNSPECIFIED, 0);
    };
    let (address, port) = inner.split_once(':').unwrap_or((inner, ""));
    (parse_ipv4(address), parse_int(port))
}

/// Parse a log datagram as produced by the publisher: base header
/// `serial`, `tag`, then the versioned web-server fields.
#[must_use]
pub fn parse_datagram(datagram: &[u8]) -> LogEntry {
    parse_with(datagram, BASE_DATAGRAM, false)
}

/// Parse a line as written to disk by a tee-style consumer: base header
/// `[timestamp]`, `[ip:port]`, `serial`, `tag`, then the versioned fields.
#[must_use]
pub fn parse_logged_line(line: &[u8]) -> LogEntry {
    parse_with(line, BASE_LOGGED, true)
}

fn parse_with(bytes: &[u8], base: &[Field], split_newlines: bool) -> LogEntry {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let bytes = &bytes[..end];

    let mut entry = LogEntry {
        raw: String::from_utf8_lossy(bytes).into_owned(),
        ..LogEntry::default()
    };

    let fields: Vec<Cow<'_, str>> = bytes
        .split(|&b| b == DELIMITER || (split_newlines && b == b'\n'))
        .map(String::from_utf8_lossy)
        .collect();
    let mut position = fields.iter().map(|field| field.as_ref());

    for field in base {
        match position.next() {
            Some(value) => field.apply(&mut entry, value),
            None => return entry,
        }
    }

    let schema = if fields
        .get(base.len())
        .is_some_and(|next| next.eq_ignore_ascii_case("v2"))
    {
        FIELDS_V2
    } else {
        entry.version = 1;
        FIELDS_V1
    };

    for field in schema {
        match position.next() {
            Some(value) => field.apply(&mut entry, value),
            None => break,
        }
    }
    entry
}
