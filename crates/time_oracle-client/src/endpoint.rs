// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! One line of a server list: `host` or `host|port`.
//!
//! The host may be an IPv4 literal, a bracketed IPv6 literal, or a DNS
//! name:
//!
//! ```text
//! 82.142.168.18
//! 82.142.168.18|123
//! [2001:6d0:ffd4::1]|123
//! time.cloudflare.com|4460
//! ```

use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;

/// A parsed server list entry.
///
/// The port is `None` when the line did not name one; the protocol default
/// then applies.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Endpoint {
    host: String,
    port: Option<u16>,
}

/// A server list line whose port field is not a usable port.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EndpointError {
    /// The port field is not a base-10 integer.
    InvalidPort {
        /// The offending port text.
        text: String,
        /// The whole line.
        line: String,
    },
    /// The port field is an integer outside `1..=65535`.
    PortOutOfRange {
        /// The parsed value.
        port: i64,
        /// The whole line.
        line: String,
    },
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointError::InvalidPort { text, line } => {
                write!(f, "bad port number {text:?} in line {line:?}")
            }
            EndpointError::PortOutOfRange { port, line } => {
                write!(f, "port {port} out of range 1-65535 in line {line:?}")
            }
        }
    }
}

impl std::error::Error for EndpointError {}

impl Endpoint {
    /// Create an endpoint directly.
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Endpoint {
            host: host.into(),
            port,
        }
    }

    /// Parse one server list line.
    ///
    /// Fields are separated by `|`. The host is taken verbatim (an empty host
    /// is accepted and fails at resolution). Fields after the port are
    /// ignored.
    pub fn parse(line: &str) -> Result<Self, EndpointError> {
        let mut fields = line.split('|');
        let host = fields.next().unwrap_or_default();
        let port = match fields.next() {
            None => None,
            Some(text) => Some(parse_port(text, line)?),
        };
        Ok(Endpoint::new(host, port))
    }

    /// The host as written in the list.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The explicit port, if any.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The NTS-KE target: the host alone when no port was given, otherwise
    /// `host:port`.
    pub fn ke_address(&self) -> String {
        match self.port {
            None => self.host.clone(),
            Some(port) => format!("{}:{}", self.host, port),
        }
    }

    /// Resolve to socket addresses, using `default_port` when none was given.
    ///
    /// IP literals, bracketed or not, are used without a DNS lookup.
    pub fn socket_addrs(&self, default_port: u16) -> io::Result<Vec<SocketAddr>> {
        let port = self.port.unwrap_or(default_port);
        resolve(&self.host, port)
    }
}

pub(crate) fn resolve(host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    let addrs: Vec<SocketAddr> = match bare.parse::<IpAddr>() {
        Ok(ip) => vec![SocketAddr::new(ip, port)],
        Err(_) => (bare, port).to_socket_addrs()?.collect(),
    };
    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("address resolved to no socket addresses: {host}"),
        ));
    }
    Ok(addrs)
}

fn parse_port(text: &str, line: &str) -> Result<u16, EndpointError> {
    let value: i64 = text.parse().map_err(|_| EndpointError::InvalidPort {
        text: text.to_string(),
        line: line.to_string(),
    })?;
    match u16::try_from(value) {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(EndpointError::PortOutOfRange {
            port: value,
            line: line.to_string(),
        }),
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            None => f.write_str(&self.host),
            Some(port) => write!(f, "{}|{}", self.host, port),
        }
    }
}
