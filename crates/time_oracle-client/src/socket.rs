// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! UDP and TCP socket creation with TTL, local bind and timeouts applied
//! through `socket2`.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::debug;

use crate::options::QueryOptions;

/// Select the bind address for a target: the configured local address, or
/// the unspecified address of the target's family.
pub(crate) fn bind_addr_for(target: &SocketAddr, local: Option<IpAddr>) -> SocketAddr {
    let ip = local.unwrap_or(match target {
        SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    });
    SocketAddr::new(ip, 0)
}

/// The first resolved address whose family matches the local address, or
/// simply the first when no local address is configured.
pub(crate) fn select_target(resolved: &[SocketAddr], local: Option<IpAddr>) -> SocketAddr {
    let matching = local.and_then(|ip| {
        resolved
            .iter()
            .find(|a| a.is_ipv4() == ip.is_ipv4())
            .copied()
    });
    matching.unwrap_or(resolved[0])
}

fn new_socket(target: &SocketAddr, ty: Type, protocol: Protocol, ttl: u32) -> io::Result<Socket> {
    let domain = if target.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, ty, Some(protocol))?;
    if target.is_ipv4() {
        socket.set_ttl(ttl)?;
    } else {
        socket.set_unicast_hops_v6(ttl)?;
    }
    Ok(socket)
}

/// A UDP socket for one exchange with `target`.
pub(crate) fn udp_for(target: &SocketAddr, opts: &QueryOptions) -> io::Result<UdpSocket> {
    let socket = new_socket(target, Type::DGRAM, Protocol::UDP, opts.ttl)?;
    socket.bind(&bind_addr_for(target, opts.local_address).into())?;
    socket.set_read_timeout(Some(opts.timeout))?;
    socket.set_write_timeout(Some(opts.timeout))?;
    Ok(socket.into())
}

/// A TCP connection to the first reachable address in `targets`.
pub(crate) fn tcp_connect(
    targets: &[SocketAddr],
    opts: &QueryOptions,
    timeout: Duration,
) -> io::Result<TcpStream> {
    let mut last_err = None;
    for target in targets {
        match tcp_connect_one(target, opts, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(%target, error = %e, "TCP connect failed");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "no addresses to connect to")
    }))
}

fn tcp_connect_one(
    target: &SocketAddr,
    opts: &QueryOptions,
    timeout: Duration,
) -> io::Result<TcpStream> {
    let socket = new_socket(target, Type::STREAM, Protocol::TCP, opts.ttl)?;
    if opts.local_address.is_some() {
        socket.bind(&bind_addr_for(target, opts.local_address).into())?;
    }
    socket.connect_timeout(&SockAddr::from(*target), timeout)?;
    socket.set_read_timeout(Some(timeout))?;
    socket.set_write_timeout(Some(timeout))?;
    Ok(socket.into())
}
