// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Oracle configuration.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use oracle_client::{QueryOptions, SecureSessionOptions};

use crate::source::MAX_SOURCE_BYTES;

/// Default plain NTP server list.
pub const DEFAULT_NTP_LIST: &str = "ntp.txt";

/// Default NTS server list.
pub const DEFAULT_NTS_LIST: &str = "nts.txt";

/// Everything an [`Oracle`](crate::Oracle) needs for one acquisition.
#[derive(Clone, Debug)]
pub struct OracleConfig {
    /// Server list for plain NTP.
    pub ntp_list: PathBuf,
    /// Server list for NTS.
    pub nts_list: PathBuf,
    /// Options for each NTP exchange, plain or authenticated.
    pub query: QueryOptions,
    /// Options for NTS key establishment.
    pub session: SecureSessionOptions,
    /// Size limit for either list.
    pub max_source_bytes: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            ntp_list: PathBuf::from(DEFAULT_NTP_LIST),
            nts_list: PathBuf::from(DEFAULT_NTS_LIST),
            query: QueryOptions::default(),
            session: SecureSessionOptions::default(),
            max_source_bytes: MAX_SOURCE_BYTES,
        }
    }
}

impl OracleConfig {
    /// Create a builder starting from the defaults.
    pub fn builder() -> OracleConfigBuilder {
        OracleConfigBuilder {
            config: OracleConfig::default(),
        }
    }
}

/// Builder for [`OracleConfig`].
#[derive(Clone, Debug)]
pub struct OracleConfigBuilder {
    config: OracleConfig,
}

impl OracleConfigBuilder {
    /// Set the plain NTP server list (default: `ntp.txt`).
    pub fn ntp_list(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ntp_list = path.into();
        self
    }

    /// Set the NTS server list (default: `nts.txt`).
    pub fn nts_list(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.nts_list = path.into();
        self
    }

    /// Bound every exchange and every key establishment by `timeout`
    /// (default: 5s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.query.timeout = timeout;
        self.config.session.timeout = timeout;
        self
    }

    /// Set the IP TTL / hop limit on outgoing packets (default: 128).
    pub fn ttl(mut self, ttl: u32) -> Self {
        self.config.query.ttl = ttl;
        self
    }

    /// Set the NTP version written into plain requests (default: 4).
    pub fn version(mut self, version: u8) -> Self {
        self.config.query.version = version;
        self
    }

    /// Bind outgoing sockets to `addr`.
    pub fn local_address(mut self, addr: IpAddr) -> Self {
        self.config.query.local_address = Some(addr);
        self
    }

    /// Replace the certificate trust policy for NTS-KE.
    pub fn tls_config(mut self, config: Arc<rustls::ClientConfig>) -> Self {
        self.config.session.tls_config = Some(config);
        self
    }

    /// Set the AEAD algorithms offered in NTS-KE, most preferred first.
    pub fn aead_algorithms(mut self, algorithms: Vec<u16>) -> Self {
        self.config.session.aead_algorithms = algorithms;
        self
    }

    /// Set the list size limit (default: 102400 bytes).
    pub fn max_source_bytes(mut self, max: u64) -> Self {
        self.config.max_source_bytes = max;
        self
    }

    /// Finish building.
    pub fn build(self) -> OracleConfig {
        self.config
    }
}
