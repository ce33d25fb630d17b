// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests.

// Integration test helpers are `pub` so each `tests/*.rs` file can import them
// via `mod common`, but clippy flags them as unreachable outside the crate.
#![allow(unreachable_pub, dead_code)]

use std::io::Write;
use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

use oracle_proto::protocol::{self, ReadBytes, WriteBytes};
use oracle_proto::unix_time::Instant;

/// Spawn a loopback NTP responder that answers up to `replies` requests,
/// passing each healthy reply through `shape` first.
pub fn spawn_ntp_responder<F>(replies: usize, shape: F) -> SocketAddr
where
    F: Fn(&mut protocol::Packet) + Send + 'static,
{
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let addr = sock.local_addr().unwrap();
    thread::spawn(move || {
        let mut buf = [0u8; 1024];
        for _ in 0..replies {
            let Ok((len, peer)) = sock.recv_from(&mut buf) else {
                return;
            };
            let mut reader = &buf[..len];
            let Ok(request) = reader.read_bytes::<protocol::Packet>() else {
                continue;
            };
            let mut reply = healthy_reply(&request);
            shape(&mut reply);
            let mut out = Vec::with_capacity(48);
            out.write_bytes(reply).unwrap();
            let _ = sock.send_to(&out, peer);
        }
    });
    addr
}

/// A loopback UDP port with nothing listening on it.
pub fn closed_port() -> SocketAddr {
    UdpSocket::bind("127.0.0.1:0").unwrap().local_addr().unwrap()
}

fn healthy_reply(request: &protocol::Packet) -> protocol::Packet {
    let now = Instant::now();
    protocol::Packet {
        version: protocol::Version::V4,
        mode: protocol::Mode::Server,
        stratum: protocol::Stratum(1),
        poll: 6,
        precision: -20,
        reference_id: protocol::ReferenceIdentifier(*b"GPS\0"),
        reference_timestamp: Instant::new(now.secs() - 1, 0).into(),
        origin_timestamp: request.transmit_timestamp,
        receive_timestamp: now.into(),
        transmit_timestamp: now.into(),
        ..protocol::Packet::default()
    }
}

/// Write a server list into `dir` and return its path.
pub fn write_list(dir: &tempfile::TempDir, name: &str, lines: &[String]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    path
}

/// `127.0.0.1|port` for a list line.
pub fn line_for(addr: SocketAddr) -> String {
    format!("{}|{}", addr.ip(), addr.port())
}
