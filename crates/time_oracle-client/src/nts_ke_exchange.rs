// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! NTS-KE (Key Establishment) protocol processing, separated from the TLS
//! stream so it can be driven from any reader.

use std::io;

use tracing::{debug, warn};

use crate::error::{NegotiationError, QueryError, TrustError};
use crate::nts_common::*;
use crate::protocol;

/// Upper bound on records accepted in one NTS-KE response.
pub const MAX_KE_RECORDS: usize = 64;

/// What the server agreed to, before keys are exported.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Negotiated {
    /// Chosen AEAD algorithm.
    pub aead_algorithm: u16,
    /// Cookies for the time exchange.
    pub cookies: Vec<Vec<u8>>,
    /// Time server host.
    pub ntp_server: String,
    /// Time server port.
    pub ntp_port: u16,
}

/// Split an NTS-KE address into host and port.
///
/// `host` alone uses port 4460. Bracketed IPv6 literals may carry a port
/// (`[::1]:4460`); a bare IPv6 literal never does.
pub fn split_ke_address(server: &str) -> (&str, u16) {
    if let Some((host, port)) = server.rsplit_once(':')
        && (host.ends_with(']') || !host.contains(':'))
        && let Ok(p) = port.parse::<u16>()
    {
        return (host, p);
    }
    (server, NTS_KE_DEFAULT_PORT)
}

/// Build the NTS-KE client request.
///
/// 1. Next Protocol: NTPv4 (critical)
/// 2. AEAD Algorithms: `aead_algorithms` in preference order (critical)
/// 3. End of Message (critical)
pub fn build_nts_ke_request(aead_algorithms: &[u16]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_ke_record(
        &mut buf,
        true,
        NTS_KE_NEXT_PROTOCOL,
        &NTS_PROTOCOL_NTPV4.to_be_bytes(),
    );
    let offered: Vec<u8> = aead_algorithms
        .iter()
        .flat_map(|alg| alg.to_be_bytes())
        .collect();
    write_ke_record(&mut buf, true, NTS_KE_AEAD_ALGORITHM, &offered);
    write_ke_record(&mut buf, true, NTS_KE_END_OF_MESSAGE, &[]);
    buf
}

/// Read records up to and including End of Message.
pub fn read_records<R: io::Read>(mut reader: R) -> Result<Vec<NtsKeRecord>, QueryError> {
    let mut records = Vec::new();
    loop {
        if records.len() == MAX_KE_RECORDS {
            return Err(NegotiationError::TooManyRecords.into());
        }
        let record = NtsKeRecord::read_from(&mut reader).map_err(tls_io_error)?;
        let is_eom = record.record_type == NTS_KE_END_OF_MESSAGE;
        records.push(record);
        if is_eom {
            return Ok(records);
        }
    }
}

/// Classify an I/O error from a TLS stream: certificate failures are trust
/// failures, everything else is transport.
pub(crate) fn tls_io_error(err: io::Error) -> QueryError {
    if let Some(tls) = err.get_ref().and_then(|e| e.downcast_ref::<rustls::Error>())
        && is_certificate_error(tls)
    {
        return QueryError::Trust(TrustError::Certificate(tls.clone()));
    }
    QueryError::Io(err)
}

fn is_certificate_error(err: &rustls::Error) -> bool {
    matches!(
        err,
        rustls::Error::InvalidCertificate(_)
            | rustls::Error::NoCertificatesPresented
            | rustls::Error::AlertReceived(
                rustls::AlertDescription::BadCertificate
                    | rustls::AlertDescription::UnknownCA
                    | rustls::AlertDescription::CertificateUnknown
            )
    )
}

/// Negotiate over the server's records.
///
/// `default_host` is used for the time exchange unless a Server record
/// redirects it; the default port is 123. The server must agree to NTPv4 and
/// to one of the `offered` AEAD algorithms, and supply at least one cookie.
pub fn negotiate(
    records: &[NtsKeRecord],
    default_host: &str,
    offered: &[u16],
) -> Result<Negotiated, NegotiationError> {
    let mut next_protocol: Option<u16> = None;
    let mut aead_algorithm: Option<u16> = None;
    let mut cookies = Vec::new();
    let mut ntp_server = default_host.to_string();
    let mut ntp_port = protocol::PORT;

    for record in records {
        match record.record_type {
            NTS_KE_END_OF_MESSAGE => {
                debug!("NTS-KE: end of message");
                break;
            }
            NTS_KE_NEXT_PROTOCOL => {
                let proto = record.body_u16().ok_or(NegotiationError::RecordTooShort {
                    record_type: "next protocol",
                })?;
                if proto != NTS_PROTOCOL_NTPV4 {
                    return Err(NegotiationError::UnsupportedProtocol { protocol: proto });
                }
                next_protocol = Some(proto);
                debug!(
                    protocol = format_args!("0x{:04X}", proto),
                    "NTS-KE: next protocol negotiated"
                );
            }
            NTS_KE_AEAD_ALGORITHM => {
                let algorithm = record.body_u16().ok_or(NegotiationError::RecordTooShort {
                    record_type: "AEAD algorithm",
                })?;
                if !offered.contains(&algorithm) {
                    return Err(NegotiationError::UnsupportedAeadAlgorithm { algorithm });
                }
                aead_algorithm = Some(algorithm);
                debug!(aead_algorithm = algorithm, "NTS-KE: AEAD algorithm negotiated");
            }
            NTS_KE_ERROR => {
                let code = record.body_u16().unwrap_or(0);
                return Err(NegotiationError::ServerError { code });
            }
            NTS_KE_WARNING => {
                warn!(code = record.body_u16().unwrap_or(0), "NTS-KE warning");
            }
            NTS_KE_NEW_COOKIE => {
                debug!(cookie_len = record.body.len(), "NTS-KE: received cookie");
                cookies.push(record.body.clone());
            }
            NTS_KE_SERVER => {
                ntp_server = String::from_utf8(record.body.clone())
                    .map_err(|_| NegotiationError::InvalidServerName)?;
                debug!(%ntp_server, "NTS-KE: NTP server");
            }
            NTS_KE_PORT => {
                ntp_port = record.body_u16().ok_or(NegotiationError::RecordTooShort {
                    record_type: "port",
                })?;
                debug!(ntp_port, "NTS-KE: NTP port");
            }
            other => {
                if record.critical {
                    return Err(NegotiationError::UnrecognizedCriticalRecord {
                        record_type: other,
                    });
                }
                debug!(record_type = other, "NTS-KE: ignoring non-critical record");
            }
        }
    }

    if next_protocol.is_none() {
        return Err(NegotiationError::MissingRecord {
            record: "Next Protocol",
        });
    }
    let aead_algorithm = aead_algorithm.ok_or(NegotiationError::MissingRecord {
        record: "AEAD Algorithm",
    })?;
    if cookies.is_empty() {
        return Err(NegotiationError::NoCookies);
    }

    Ok(Negotiated {
        aead_algorithm,
        cookies,
        ntp_server,
        ntp_port,
    })
}

/// Export the C2S and S2C keys (RFC 8915 Section 5.1).
pub fn export_keys(
    tls_conn: &rustls::ClientConnection,
    aead_algorithm: u16,
) -> Result<(Vec<u8>, Vec<u8>), NegotiationError> {
    let key_len =
        aead_key_length(aead_algorithm).map_err(|e| NegotiationError::KeyExport {
            detail: e.to_string(),
        })?;
    let export = |context: [u8; 5]| {
        tls_conn
            .export_keying_material(vec![0u8; key_len], NTS_EXPORTER_LABEL, Some(&context[..]))
            .map_err(|e| NegotiationError::KeyExport {
                detail: e.to_string(),
            })
    };
    let c2s_key = export(c2s_exporter_context(aead_algorithm))?;
    let s2c_key = export(s2c_exporter_context(aead_algorithm))?;
    Ok((c2s_key, s2c_key))
}
