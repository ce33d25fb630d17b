// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Failure taxonomy for a single query.
//!
//! Every query returns `Result<_, QueryError>`. The variant says what kind of
//! problem ended the attempt, which callers use to decide how loudly to log
//! it; all of them are non-fatal to a scan over a server list.
//!
//! ```no_run
//! use oracle_client::{Endpoint, PlainClient, QueryError, TimeQuery, ValidationError};
//!
//! let client = PlainClient::default();
//! match client.query(&Endpoint::new("time.nist.gov", None)) {
//!     Ok(r) => println!("{r}"),
//!     Err(QueryError::Validation(ValidationError::KissOfDeath { code })) => {
//!         eprintln!("kiss code {code}")
//!     }
//!     Err(e) if e.is_tampering() => eprintln!("possible tampering: {e}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

use std::fmt;
use std::io;

pub use oracle_proto::error::ParseError;
pub use oracle_proto::nts_common::NtsProtoError;

/// Errors that end one query against one endpoint.
#[derive(Debug)]
pub enum QueryError {
    /// Socket, resolution, connect or timeout failure.
    Io(io::Error),
    /// The reply was malformed or did not answer our request.
    Protocol(ProtocolError),
    /// The reply was well formed but failed the sanity rules.
    Validation(ValidationError),
    /// Certificate, negotiation or authenticity failure on an NTS path.
    Trust(TrustError),
}

/// The coarse class of a failure, used for logging and counting.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FailureKind {
    /// The server list line could not be parsed.
    Parse,
    /// Network, timeout or malformed reply.
    Transport,
    /// Sanity validation rejected the reply.
    Validation,
    /// Certificate, negotiation or authenticity failure.
    Trust,
}

/// Reply checks that tie a datagram to the request it answers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProtocolError {
    /// Reply shorter than the 48-byte header.
    ResponseTooShort {
        /// Bytes received.
        received: usize,
    },
    /// Reply came from an address the endpoint did not resolve to.
    UnexpectedSource,
    /// Reply mode is not Server.
    UnexpectedMode,
    /// Origin timestamp does not echo our transmit timestamp.
    OriginTimestampMismatch,
    /// Server transmit timestamp is zero.
    ZeroTransmitTimestamp,
    /// The header could not be decoded.
    Malformed(ParseError),
    /// The configured protocol version is not 2, 3 or 4.
    UnsupportedVersion {
        /// The configured value.
        version: u8,
    },
}

/// Sanity rules a reply must satisfy before its time is used.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationError {
    /// Stratum 0: the reference identifier carries a kiss code.
    KissOfDeath {
        /// The kiss code as ASCII (e.g. `DENY`, `RATE`, `INIT`).
        code: String,
    },
    /// Stratum 16 or above.
    InvalidStratum {
        /// The reported stratum.
        stratum: u8,
    },
    /// Leap indicator 3: the server clock is not synchronized.
    Unsynchronized,
    /// Root distance exceeds the maximum dispersion.
    InvalidDispersion {
        /// `root_delay / 2 + root_dispersion`, in seconds.
        root_distance: f64,
    },
    /// Transmit time precedes the reference time.
    InvalidTime,
    /// The server clock was last set too long before its transmit time.
    StaleClock {
        /// Seconds between reference and transmit time.
        age_secs: i64,
    },
}

/// Failures that bear on whether an NTS source can be trusted at all.
#[derive(Debug)]
pub enum TrustError {
    /// The TLS handshake failed certificate verification.
    Certificate(rustls::Error),
    /// Key establishment did not produce a usable session.
    Negotiation(NegotiationError),
    /// The reply could not be attributed to the keyed server.
    Authenticity(AuthenticityError),
}

/// Ways NTS key establishment can fail after the handshake.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NegotiationError {
    /// The server sent an Error record.
    ServerError {
        /// The error code.
        code: u16,
    },
    /// A record body was shorter than its type requires.
    RecordTooShort {
        /// Which record.
        record_type: &'static str,
    },
    /// The server chose a protocol other than NTPv4.
    UnsupportedProtocol {
        /// The protocol identifier.
        protocol: u16,
    },
    /// The server chose an AEAD algorithm we did not offer.
    UnsupportedAeadAlgorithm {
        /// The algorithm identifier.
        algorithm: u16,
    },
    /// A critical record type we do not understand.
    UnrecognizedCriticalRecord {
        /// The record type.
        record_type: u16,
    },
    /// A required record was absent.
    MissingRecord {
        /// Which record.
        record: &'static str,
    },
    /// The server supplied no cookies.
    NoCookies,
    /// The server sent more records than a response may hold.
    TooManyRecords,
    /// The Server record is not valid UTF-8.
    InvalidServerName,
    /// TLS key export failed.
    KeyExport {
        /// Detail from the TLS layer.
        detail: String,
    },
}

/// Ways an NTS reply can fail to authenticate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AuthenticityError {
    /// Reply came from an address the time server did not resolve to.
    UnexpectedSource,
    /// Origin timestamp does not echo our request; possible replay.
    OriginTimestampMismatch,
    /// The AEAD layer rejected the reply.
    Nts(NtsProtoError),
}

// ── Display implementations ─────────────────────────────────────────

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Io(e) => write!(f, "{e}"),
            QueryError::Protocol(e) => write!(f, "NTP protocol error: {e}"),
            QueryError::Validation(e) => write!(f, "invalid NTP response: {e}"),
            QueryError::Trust(e) => write!(f, "NTS trust failure: {e}"),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Parse => "parse",
            FailureKind::Transport => "transport",
            FailureKind::Validation => "validation",
            FailureKind::Trust => "trust",
        })
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::ResponseTooShort { received } => {
                write!(f, "NTP response too short ({received} bytes)")
            }
            ProtocolError::UnexpectedSource => write!(f, "response from unexpected source address"),
            ProtocolError::UnexpectedMode => {
                write!(f, "unexpected response mode (expected Server)")
            }
            ProtocolError::OriginTimestampMismatch => {
                write!(
                    f,
                    "origin timestamp mismatch: response does not match our request"
                )
            }
            ProtocolError::ZeroTransmitTimestamp => {
                write!(f, "server transmit timestamp is zero")
            }
            ProtocolError::Malformed(e) => write!(f, "{e}"),
            ProtocolError::UnsupportedVersion { version } => {
                write!(f, "invalid protocol version {version}")
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::KissOfDeath { code } => write!(f, "kiss of death received: {code}"),
            ValidationError::InvalidStratum { stratum } => {
                write!(f, "invalid stratum in response: {stratum}")
            }
            ValidationError::Unsynchronized => write!(f, "invalid leap second"),
            ValidationError::InvalidDispersion { root_distance } => {
                write!(f, "invalid dispersion: root distance {root_distance:.6}s")
            }
            ValidationError::InvalidTime => write!(f, "invalid time reported"),
            ValidationError::StaleClock { age_secs } => {
                write!(f, "server clock not synchronized for {age_secs}s")
            }
        }
    }
}

impl fmt::Display for TrustError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustError::Certificate(e) => write!(f, "certificate rejected: {e}"),
            TrustError::Negotiation(e) => write!(f, "NTS-KE negotiation failed: {e}"),
            TrustError::Authenticity(e) => write!(f, "response not authentic: {e}"),
        }
    }
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationError::ServerError { code } => write!(f, "NTS-KE server error: code {code}"),
            NegotiationError::RecordTooShort { record_type } => {
                write!(f, "NTS-KE record too short: {record_type}")
            }
            NegotiationError::UnsupportedProtocol { protocol } => {
                write!(f, "unsupported NTS-KE protocol: 0x{protocol:04X}")
            }
            NegotiationError::UnsupportedAeadAlgorithm { algorithm } => {
                write!(f, "server chose unoffered AEAD algorithm {algorithm}")
            }
            NegotiationError::UnrecognizedCriticalRecord { record_type } => {
                write!(f, "unrecognized critical NTS-KE record type: {record_type}")
            }
            NegotiationError::MissingRecord { record } => {
                write!(f, "missing NTS-KE record: {record}")
            }
            NegotiationError::NoCookies => write!(f, "server did not provide any cookies"),
            NegotiationError::TooManyRecords => write!(f, "too many NTS-KE records"),
            NegotiationError::InvalidServerName => write!(f, "invalid NTS-KE server name"),
            NegotiationError::KeyExport { detail } => write!(f, "TLS key export failed: {detail}"),
        }
    }
}

impl fmt::Display for AuthenticityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthenticityError::UnexpectedSource => {
                write!(f, "response from unexpected source address")
            }
            AuthenticityError::OriginTimestampMismatch => {
                write!(f, "origin timestamp mismatch, possible replay")
            }
            AuthenticityError::Nts(e) => write!(f, "{e}"),
        }
    }
}

// ── Error trait implementations ─────────────────────────────────────

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Io(e) => Some(e),
            QueryError::Protocol(e) => Some(e),
            QueryError::Validation(e) => Some(e),
            QueryError::Trust(e) => Some(e),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for TrustError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrustError::Certificate(e) => Some(e),
            TrustError::Negotiation(e) => Some(e),
            TrustError::Authenticity(e) => Some(e),
        }
    }
}

impl std::error::Error for ValidationError {}
impl std::error::Error for NegotiationError {}
impl std::error::Error for AuthenticityError {}

// ── Classification ──────────────────────────────────────────────────

impl QueryError {
    /// The coarse failure class.
    pub fn kind(&self) -> FailureKind {
        match self {
            QueryError::Io(_) | QueryError::Protocol(_) => FailureKind::Transport,
            QueryError::Validation(_) => FailureKind::Validation,
            QueryError::Trust(_) => FailureKind::Trust,
        }
    }

    /// Whether the failure suggests an on-path attacker: an NTS reply that
    /// did not authenticate.
    pub fn is_tampering(&self) -> bool {
        matches!(self, QueryError::Trust(TrustError::Authenticity(_)))
    }
}

// ── From conversions ────────────────────────────────────────────────

impl From<io::Error> for QueryError {
    fn from(err: io::Error) -> QueryError {
        // Header decode failures surface as io::Error; keep them typed.
        if let Some(parse) = err.get_ref().and_then(|e| e.downcast_ref::<ParseError>()) {
            return QueryError::Protocol(ProtocolError::Malformed(parse.clone()));
        }
        QueryError::Io(err)
    }
}

impl From<ProtocolError> for QueryError {
    fn from(err: ProtocolError) -> QueryError {
        QueryError::Protocol(err)
    }
}

impl From<ValidationError> for QueryError {
    fn from(err: ValidationError) -> QueryError {
        QueryError::Validation(err)
    }
}

impl From<TrustError> for QueryError {
    fn from(err: TrustError) -> QueryError {
        QueryError::Trust(err)
    }
}

impl From<NegotiationError> for QueryError {
    fn from(err: NegotiationError) -> QueryError {
        QueryError::Trust(TrustError::Negotiation(err))
    }
}

impl From<AuthenticityError> for QueryError {
    fn from(err: AuthenticityError) -> QueryError {
        QueryError::Trust(TrustError::Authenticity(err))
    }
}

// ── Tests ───────────────────────────────────────────────────────────
