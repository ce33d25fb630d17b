// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ProtocolError;
use crate::nts_common::{AEAD_AES_SIV_CMAC_256, AEAD_AES_SIV_CMAC_512};
use crate::protocol;

/// Default per-exchange timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default IP time-to-live / hop limit for outgoing packets.
pub const DEFAULT_TTL: u32 = 128;

/// Default NTP protocol version.
pub const DEFAULT_VERSION: u8 = 4;

/// Options for one NTP exchange.
///
/// Built once per acquisition and shared read-only by every attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryOptions {
    /// Bound on the send and on the receive.
    pub timeout: Duration,
    /// IP TTL (IPv4) or unicast hop limit (IPv6).
    pub ttl: u32,
    /// NTP version written into requests; 2, 3 or 4.
    pub version: u8,
    /// Local address to bind; the unspecified address when `None`.
    pub local_address: Option<IpAddr>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            timeout: DEFAULT_TIMEOUT,
            ttl: DEFAULT_TTL,
            version: DEFAULT_VERSION,
            local_address: None,
        }
    }
}

impl QueryOptions {
    /// The configured version as a wire value.
    pub fn protocol_version(&self) -> Result<protocol::Version, ProtocolError> {
        protocol::Version::new(self.version).ok_or(ProtocolError::UnsupportedVersion {
            version: self.version,
        })
    }
}

/// Options for NTS key establishment.
#[derive(Clone, Debug)]
pub struct SecureSessionOptions {
    /// Certificate trust policy. `None` uses TLS 1.3 with the WebPKI roots.
    pub tls_config: Option<Arc<rustls::ClientConfig>>,
    /// Bound on the TCP connect and on each TLS read or write.
    pub timeout: Duration,
    /// AEAD algorithms offered, most preferred first.
    pub aead_algorithms: Vec<u16>,
}

impl Default for SecureSessionOptions {
    fn default() -> Self {
        SecureSessionOptions {
            tls_config: None,
            timeout: DEFAULT_TIMEOUT,
            aead_algorithms: vec![AEAD_AES_SIV_CMAC_512, AEAD_AES_SIV_CMAC_256],
        }
    }
}
