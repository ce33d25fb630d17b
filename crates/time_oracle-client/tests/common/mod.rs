// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests.

// Integration test helpers are `pub` so each `tests/*.rs` file can import them
// via `mod common`, but not every file uses every helper.
#![allow(unreachable_pub, dead_code)]

use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

use oracle_client::protocol::{self, ReadBytes};
use oracle_client::unix_time::Instant;
use oracle_client::{QueryError, TrustError};

/// Returns `true` if the I/O error indicates a network-level failure that
/// should cause the test to be **skipped** (not panicked).
///
/// CI runners occasionally lack outbound UDP/123 or TCP/4460 access, causing
/// errors such as `ENETUNREACH` (101) or `EHOSTUNREACH` (113) in addition to
/// the usual `TimedOut` / `WouldBlock`.
pub fn is_network_skip_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::AddrNotAvailable
    ) || e.raw_os_error() == Some(101) // ENETUNREACH  (Network is unreachable)
      || e.raw_os_error() == Some(113) // EHOSTUNREACH (No route to host)
      || e.to_string().contains("Network is unreachable")
      || e.to_string().contains("No route to host")
      || e.to_string().contains("timed out")
      || e.to_string().contains("Connection refused")
      || e.to_string().contains("Connection reset")
      || e.to_string().contains("close_notify")
      || e.to_string().contains("failed to lookup address")
}

/// Like [`is_network_skip_error`] for query failures. Certificate failures
/// count too: sandboxed runners sometimes intercept TLS.
pub fn is_query_skip_error(e: &QueryError) -> bool {
    match e {
        QueryError::Io(io) => is_network_skip_error(io),
        QueryError::Trust(TrustError::Certificate(_)) => true,
        _ => false,
    }
}

/// Helper to check if we're in a network-restricted environment (CI, firewall, etc.)
pub fn is_network_available() -> bool {
    std::env::var("SKIP_NETWORK_TESTS").is_err()
}

/// Spawn a one-shot UDP responder on loopback.
///
/// `respond` sees the raw request and returns the datagram to send back, or
/// `None` to stay silent.
pub fn spawn_responder<F>(respond: F) -> SocketAddr
where
    F: FnOnce(&[u8]) -> Option<Vec<u8>> + Send + 'static,
{
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let addr = sock.local_addr().unwrap();
    thread::spawn(move || {
        let mut buf = [0u8; 2048];
        if let Ok((len, peer)) = sock.recv_from(&mut buf) {
            if let Some(reply) = respond(&buf[..len]) {
                let _ = sock.send_to(&reply, peer);
            }
        }
    });
    addr
}

/// The header of a client request.
pub fn request_header(request: &[u8]) -> protocol::Packet {
    let mut reader = request;
    reader.read_bytes::<protocol::Packet>().unwrap()
}

/// A healthy stratum 2 reply to `request`, stamped with the current time.
pub fn server_reply(request: &[u8]) -> protocol::Packet {
    let req = request_header(request);
    let now = Instant::now();
    protocol::Packet {
        leap_indicator: protocol::LeapIndicator::NoWarning,
        version: protocol::Version::V4,
        mode: protocol::Mode::Server,
        stratum: protocol::Stratum(2),
        poll: 6,
        precision: -20,
        reference_id: protocol::ReferenceIdentifier([127, 0, 0, 1]),
        reference_timestamp: Instant::new(now.secs() - 10, 0).into(),
        origin_timestamp: req.transmit_timestamp,
        receive_timestamp: now.into(),
        transmit_timestamp: now.into(),
        ..protocol::Packet::default()
    }
}

/// Encode a header.
pub fn encode(pkt: protocol::Packet) -> Vec<u8> {
    use oracle_client::protocol::WriteBytes;
    let mut buf = Vec::with_capacity(48);
    buf.write_bytes(pkt).unwrap();
    buf
}
