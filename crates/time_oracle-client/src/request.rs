// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Plain NTPv4 query: packet construction, reply checks, sanity validation
//! and offset computation.
//!
//! The reply checks and sanity validation are shared with the NTS client,
//! which runs them on the NTP header of an authenticated reply.

use std::fmt;
use std::net::SocketAddr;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::{ParseError, ProtocolError, QueryError, ValidationError};
use crate::options::QueryOptions;
use crate::protocol::{self, ConstPackedSizeBytes, ReadBytes, WriteBytes};
use crate::{socket, unix_time};

/// Maximum poll interval (2^17 s); a server whose clock was last set longer
/// ago than this before replying is considered stale.
const MAX_POLL_INTERVAL_SECS: i64 = 1 << protocol::MAXPOLL;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// A validated time reading from one endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeResponse {
    /// Local observation time corrected by the measured offset, in UTC.
    pub corrected: DateTime<Utc>,
    /// `((T2 - T1) + (T3 - T4)) / 2`; positive when the local clock is behind.
    pub clock_offset: TimeDelta,
    /// `(T4 - T1) - (T3 - T2)`.
    pub round_trip: TimeDelta,
    /// Stratum reported by the server.
    pub stratum: u8,
    /// The endpoint as written in the server list.
    pub endpoint: String,
    /// Whether the reply was authenticated with NTS.
    pub authenticated: bool,
}

impl fmt::Display for TimeResponse {
    /// `YYYY-MM-DD hh:mm:ss.nnnnnnnnn +0000 UTC`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.corrected.format("%Y-%m-%d %H:%M:%S%.9f +0000 UTC")
        )
    }
}

/// A client that can ask one endpoint for the time.
///
/// Both the plain and the NTS client implement this, so a scan over a server
/// list is written once.
pub trait TimeQuery {
    /// Perform one exchange with `endpoint`.
    fn query(&self, endpoint: &Endpoint) -> Result<TimeResponse, QueryError>;
}

/// Plain (unauthenticated) NTP client.
#[derive(Clone, Debug, Default)]
pub struct PlainClient {
    options: QueryOptions,
}

impl PlainClient {
    /// Create a client that uses `options` for every query.
    pub fn new(options: QueryOptions) -> Self {
        PlainClient { options }
    }
}

impl TimeQuery for PlainClient {
    fn query(&self, endpoint: &Endpoint) -> Result<TimeResponse, QueryError> {
        query(endpoint, &self.options)
    }
}

/// Query one endpoint over plain NTP.
///
/// Sends a single client-mode request to the first resolved address (port
/// 123 unless the endpoint names one), waits at most `opts.timeout` for the
/// reply, checks that it answers our request, validates it, and returns the
/// corrected time.
pub fn query(endpoint: &Endpoint, opts: &QueryOptions) -> Result<TimeResponse, QueryError> {
    let version = opts.protocol_version()?;
    let resolved = endpoint.socket_addrs(protocol::PORT)?;
    let target = socket::select_target(&resolved, opts.local_address);

    let header = request_header(version);
    let t1 = header.transmit_timestamp;
    let mut send_buf = [0u8; protocol::Packet::PACKED_SIZE_BYTES];
    (&mut send_buf[..]).write_bytes(header)?;

    let sock = socket::udp_for(&target, opts)?;
    let sz = sock.send_to(&send_buf, target)?;
    debug!(local = ?sock.local_addr(), %target, sent = sz, "NTP request sent");

    // Larger than the header to tolerate extension fields.
    let mut recv_buf = [0u8; 1024];
    let (recv_len, src_addr) = sock.recv_from(&mut recv_buf[..])?;
    debug!(recv = recv_len, %src_addr, "NTP response received");

    let (response, t4) = check_reply(&recv_buf[..recv_len], src_addr, &resolved, &t1)?;
    finish(&response, &t1, &t4, endpoint.to_string(), false)
}

/// A client-mode header stamped with the current time as T1.
pub(crate) fn request_header(version: protocol::Version) -> protocol::Packet {
    protocol::Packet {
        version,
        mode: protocol::Mode::Client,
        transmit_timestamp: unix_time::Instant::now().into(),
        ..protocol::Packet::default()
    }
}

/// Tie a reply to our request.
///
/// Records T4 on entry, then checks the source address (IP only), length,
/// header decoding, mode, the echoed origin timestamp and a non-zero
/// transmit timestamp. `datagram` may carry extension fields after the
/// header; they are ignored here.
pub(crate) fn check_reply(
    datagram: &[u8],
    src_addr: SocketAddr,
    resolved_addrs: &[SocketAddr],
    t1: &protocol::TimestampFormat,
) -> Result<(protocol::Packet, unix_time::Instant), ProtocolError> {
    let t4 = unix_time::Instant::now();

    if !resolved_addrs.iter().any(|a| a.ip() == src_addr.ip()) {
        return Err(ProtocolError::UnexpectedSource);
    }
    if datagram.len() < protocol::Packet::PACKED_SIZE_BYTES {
        return Err(ProtocolError::ResponseTooShort {
            received: datagram.len(),
        });
    }

    let response: protocol::Packet = (&datagram[..protocol::Packet::PACKED_SIZE_BYTES])
        .read_bytes()
        .map_err(malformed)?;

    if response.mode != protocol::Mode::Server {
        return Err(ProtocolError::UnexpectedMode);
    }
    if response.origin_timestamp != *t1 {
        return Err(ProtocolError::OriginTimestampMismatch);
    }
    if response.transmit_timestamp.is_zero() {
        return Err(ProtocolError::ZeroTransmitTimestamp);
    }

    Ok((response, t4))
}

fn malformed(err: std::io::Error) -> ProtocolError {
    let parse = err
        .get_ref()
        .and_then(|e| e.downcast_ref::<ParseError>())
        .cloned()
        .unwrap_or(ParseError::BufferTooShort {
            needed: protocol::Packet::PACKED_SIZE_BYTES,
            available: 0,
        });
    ProtocolError::Malformed(parse)
}

/// Apply the sanity rules to a reply header.
///
/// `pivot` resolves the NTP era of the reference and transmit timestamps;
/// pass the time the reply was received. The rules are checked in order and
/// the first failure is returned:
///
/// 1. stratum 0 carries a kiss code;
/// 2. stratum 16 or above is unsynchronized;
/// 3. transmit more than 2^17 s after reference time is stale;
/// 4. `root_delay / 2 + root_dispersion` above 16 s is too dispersed;
/// 5. transmit before reference time is invalid;
/// 6. leap indicator 3 means the server is not in sync.
pub fn validate_sanity(
    response: &protocol::Packet,
    pivot: &unix_time::Instant,
) -> Result<(), ValidationError> {
    if response.stratum == protocol::Stratum::UNSPECIFIED {
        let code = match response.kiss_of_death() {
            Some(kod) => kod.to_string(),
            None => response.reference_id.to_ascii(),
        };
        return Err(ValidationError::KissOfDeath { code });
    }
    if response.stratum.is_unsynchronized() {
        return Err(ValidationError::InvalidStratum {
            stratum: response.stratum.0,
        });
    }

    let reference = unix_time::timestamp_to_instant(response.reference_timestamp, pivot);
    let transmit = unix_time::timestamp_to_instant(response.transmit_timestamp, pivot);
    let freshness = transmit.as_nanos() - reference.as_nanos();
    if freshness > MAX_POLL_INTERVAL_SECS as i128 * NANOS_PER_SEC {
        return Err(ValidationError::StaleClock {
            age_secs: (freshness / NANOS_PER_SEC) as i64,
        });
    }

    let root_distance =
        response.root_delay.as_secs_f64() / 2.0 + response.root_dispersion.as_secs_f64();
    if root_distance > protocol::MAXDISP {
        return Err(ValidationError::InvalidDispersion { root_distance });
    }

    if transmit < reference {
        return Err(ValidationError::InvalidTime);
    }
    if response.leap_indicator == protocol::LeapIndicator::Unknown {
        return Err(ValidationError::Unsynchronized);
    }

    Ok(())
}

/// Offset and delay in nanoseconds from the four timestamps.
pub(crate) fn compute_offset_delay(
    t1: &unix_time::Instant,
    t2: &unix_time::Instant,
    t3: &unix_time::Instant,
    t4: &unix_time::Instant,
) -> (i128, i128) {
    let (t1, t2, t3, t4) = (t1.as_nanos(), t2.as_nanos(), t3.as_nanos(), t4.as_nanos());
    let offset = ((t2 - t1) + (t3 - t4)) / 2;
    let delay = (t4 - t1) - (t3 - t2);
    (offset, delay)
}

/// Validate a checked reply and turn it into a [`TimeResponse`].
pub(crate) fn finish(
    response: &protocol::Packet,
    t1: &protocol::TimestampFormat,
    t4: &unix_time::Instant,
    endpoint: String,
    authenticated: bool,
) -> Result<TimeResponse, QueryError> {
    validate_sanity(response, t4)?;

    let t1 = unix_time::timestamp_to_instant(*t1, t4);
    let t2 = unix_time::timestamp_to_instant(response.receive_timestamp, t4);
    let t3 = unix_time::timestamp_to_instant(response.transmit_timestamp, t4);
    let (offset, delay) = compute_offset_delay(&t1, &t2, &t3, t4);

    let clock_offset = to_delta(offset)?;
    let round_trip = to_delta(delay)?;
    let corrected = Utc::now()
        .checked_add_signed(clock_offset)
        .ok_or(ValidationError::InvalidTime)?;

    debug!(
        endpoint = %endpoint,
        offset_ns = offset as i64,
        delay_ns = delay as i64,
        stratum = response.stratum.0,
        "NTP response validated"
    );

    Ok(TimeResponse {
        corrected,
        clock_offset,
        round_trip,
        stratum: response.stratum.0,
        endpoint,
        authenticated,
    })
}

fn to_delta(nanos: i128) -> Result<TimeDelta, ValidationError> {
    i64::try_from(nanos)
        .map(TimeDelta::nanoseconds)
        .map_err(|_| ValidationError::InvalidTime)
}
