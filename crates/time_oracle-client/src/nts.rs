// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Network Time Security (NTS) client implementation (RFC 8915).
//!
//! # Protocol Overview
//!
//! 1. **NTS-KE (Key Establishment)**: TLS 1.3 handshake with the NTS-KE server
//!    (default port 4460). Negotiates the AEAD algorithm, exports C2S/S2C
//!    keys, and receives cookies.
//!
//! 2. **NTS-Protected NTP**: a standard NTPv4 request augmented with a
//!    Unique Identifier, an NTS Cookie, Cookie Placeholders and an NTS
//!    Authenticator. The reply must echo the identifier and carry an
//!    authenticator that verifies under the S2C key.
//!
//! # Example
//!
//! ```no_run
//! use oracle_client::nts::NtsSession;
//! use oracle_client::{QueryOptions, SecureSessionOptions};
//!
//! let opts = QueryOptions::default();
//! let mut session =
//!     NtsSession::establish("time.cloudflare.com", &SecureSessionOptions::default(), &opts)?;
//! let response = session.query(&opts)?;
//! println!("{response}");
//! # Ok::<(), oracle_client::QueryError>(())
//! ```

use std::io::Write;
use std::net::SocketAddr;

use rustls::pki_types::ServerName;
use tracing::debug;

use crate::endpoint::{self, Endpoint};
use crate::error::{AuthenticityError, NegotiationError, ProtocolError, QueryError};
pub use crate::nts_common::NtsKeResult;
use crate::nts_common::{build_nts_request, verify_nts_response};
use crate::nts_ke_exchange::{self, tls_io_error};
use crate::options::{QueryOptions, SecureSessionOptions};
use crate::request::{self, TimeQuery, TimeResponse};
use crate::{protocol, socket, tls_config};

/// Perform NTS Key Establishment with `server` (`host` or `host:port`).
///
/// Connects over TCP (honoring the local address and TTL in `opts`),
/// completes a TLS 1.3 handshake under the trust policy in `session`,
/// negotiates NTPv4 and an AEAD algorithm, and exports the session keys.
pub fn nts_ke(
    server: &str,
    session: &SecureSessionOptions,
    opts: &QueryOptions,
) -> Result<NtsKeResult, QueryError> {
    let (hostname, port) = nts_ke_exchange::split_ke_address(server);
    debug!(%hostname, port, "NTS-KE connecting");

    let config = tls_config::session_config(session.tls_config.as_ref())
        .map_err(|e| QueryError::Io(std::io::Error::other(e)))?;
    let tls_name = hostname
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(hostname);
    let server_name = ServerName::try_from(tls_name.to_string()).map_err(|e| {
        QueryError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid server name: {e}"),
        ))
    })?;

    let addrs = endpoint::resolve(hostname, port)?;
    let mut tcp = socket::tcp_connect(&addrs, opts, session.timeout)?;

    let mut conn = rustls::ClientConnection::new(config, server_name)
        .map_err(|e| QueryError::Io(std::io::Error::other(e)))?;
    while conn.is_handshaking() {
        conn.complete_io(&mut tcp).map_err(tls_io_error)?;
    }
    let mut tls = rustls::StreamOwned::new(conn, tcp);

    let request_buf = nts_ke_exchange::build_nts_ke_request(&session.aead_algorithms);
    tls.write_all(&request_buf).map_err(tls_io_error)?;
    tls.flush().map_err(tls_io_error)?;

    let records = nts_ke_exchange::read_records(&mut tls)?;
    let negotiated =
        nts_ke_exchange::negotiate(&records, hostname, &session.aead_algorithms)?;
    let (c2s_key, s2c_key) = nts_ke_exchange::export_keys(&tls.conn, negotiated.aead_algorithm)?;

    // Best effort; the keys are already ours.
    tls.conn.send_close_notify();
    let _ = tls.flush();

    debug!(
        cookies = negotiated.cookies.len(),
        aead = negotiated.aead_algorithm,
        ntp_server = %negotiated.ntp_server,
        ntp_port = negotiated.ntp_port,
        "NTS-KE complete"
    );

    Ok(NtsKeResult {
        c2s_key,
        s2c_key,
        cookies: negotiated.cookies,
        aead_algorithm: negotiated.aead_algorithm,
        ntp_server: negotiated.ntp_server,
        ntp_port: negotiated.ntp_port,
    })
}

/// An NTS session for sending authenticated NTP requests.
///
/// Each [`query`](NtsSession::query) consumes one cookie and keeps any new
/// cookies the server returns.
#[derive(Debug)]
pub struct NtsSession {
    c2s_key: Vec<u8>,
    s2c_key: Vec<u8>,
    cookies: Vec<Vec<u8>>,
    aead_algorithm: u16,
    resolved_addrs: Vec<SocketAddr>,
    label: String,
}

impl NtsSession {
    /// Perform key establishment with `ke_address` and resolve the time
    /// server it names.
    pub fn establish(
        ke_address: &str,
        session: &SecureSessionOptions,
        opts: &QueryOptions,
    ) -> Result<Self, QueryError> {
        let ke = nts_ke(ke_address, session, opts)?;
        let mut s = Self::from_ke_result(ke)?;
        s.label = ke_address.to_string();
        Ok(s)
    }

    /// Create a session from a previously obtained [`NtsKeResult`].
    pub fn from_ke_result(ke: NtsKeResult) -> Result<Self, QueryError> {
        let resolved_addrs = endpoint::resolve(&ke.ntp_server, ke.ntp_port)?;
        let label = format!("{}:{}", ke.ntp_server, ke.ntp_port);
        Ok(NtsSession {
            c2s_key: ke.c2s_key,
            s2c_key: ke.s2c_key,
            cookies: ke.cookies,
            aead_algorithm: ke.aead_algorithm,
            resolved_addrs,
            label,
        })
    }

    /// Returns the number of remaining cookies.
    pub fn cookie_count(&self) -> usize {
        self.cookies.len()
    }

    /// Returns the AEAD algorithm negotiated during key establishment.
    pub fn aead_algorithm(&self) -> u16 {
        self.aead_algorithm
    }

    /// Returns the time server addresses replies may come from.
    pub fn ntp_addrs(&self) -> &[SocketAddr] {
        &self.resolved_addrs
    }

    /// Send one authenticated NTPv4 request and validate the reply.
    ///
    /// The reply must pass the plain reply checks, echo our Unique
    /// Identifier, and carry an authenticator that verifies under the S2C
    /// key; only then are the sanity rules applied and the time used. A
    /// reply from the wrong address or with a stale origin timestamp is
    /// reported as an authenticity failure rather than a transport one.
    pub fn query(&mut self, opts: &QueryOptions) -> Result<TimeResponse, QueryError> {
        let cookie = self.cookies.pop().ok_or(NegotiationError::NoCookies)?;

        let header = request::request_header(protocol::Version::V4);
        let t1 = header.transmit_timestamp;
        let req = build_nts_request(&header, &self.c2s_key, self.aead_algorithm, &cookie)?;

        let target = socket::select_target(&self.resolved_addrs, opts.local_address);
        let sock = socket::udp_for(&target, opts)?;
        let sz = sock.send_to(&req.datagram, target)?;
        debug!(%target, sent = sz, "NTS request sent");

        let mut recv_buf = [0u8; 2048];
        let (recv_len, src_addr) = sock.recv_from(&mut recv_buf)?;
        let datagram = &recv_buf[..recv_len];
        debug!(recv = recv_len, %src_addr, "NTS response received");

        let (response, t4) = request::check_reply(datagram, src_addr, &self.resolved_addrs, &t1)
            .map_err(reply_error)?;
        let new_cookies =
            verify_nts_response(&self.s2c_key, self.aead_algorithm, &req.unique_id, datagram)
                .map_err(AuthenticityError::Nts)?;
        self.cookies.extend(new_cookies);
        debug!(cookies = self.cookies.len(), "NTS response authenticated");

        request::finish(&response, &t1, &t4, self.label.clone(), true)
    }
}

// On the authenticated path, a reply that does not answer our request is a
// sign of interference, not of a flaky network.
fn reply_error(err: ProtocolError) -> QueryError {
    match err {
        ProtocolError::UnexpectedSource => AuthenticityError::UnexpectedSource.into(),
        ProtocolError::OriginTimestampMismatch => {
            AuthenticityError::OriginTimestampMismatch.into()
        }
        other => other.into(),
    }
}

/// NTS client: a fresh session per query, never reused.
#[derive(Clone, Debug, Default)]
pub struct NtsClient {
    session: SecureSessionOptions,
    options: QueryOptions,
}

impl NtsClient {
    /// Create a client with the given key establishment and query options.
    pub fn new(session: SecureSessionOptions, options: QueryOptions) -> Self {
        NtsClient { session, options }
    }
}

impl TimeQuery for NtsClient {
    fn query(&self, endpoint: &Endpoint) -> Result<TimeResponse, QueryError> {
        let mut session = NtsSession::establish(&endpoint.ke_address(), &self.session, &self.options)?;
        let mut response = session.query(&self.options)?;
        response.endpoint = endpoint.to_string();
        Ok(response)
    }
}
