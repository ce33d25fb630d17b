// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

// TLS configuration for NTS key establishment: TLS 1.3 only, the ring
// provider, and the `ntske/1` ALPN identifier.

use std::sync::Arc;

use crate::nts_common::NTS_KE_ALPN;

fn crypto_provider() -> rustls::crypto::CryptoProvider {
    rustls::crypto::ring::default_provider()
}

/// Build a TLS client configuration for NTS-KE (RFC 8915) that trusts the
/// Mozilla WebPKI root set.
pub fn nts_client_config() -> Result<rustls::ClientConfig, rustls::Error> {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    nts_client_config_with_roots(root_store)
}

/// Build a TLS client configuration for NTS-KE that trusts only `roots`.
pub fn nts_client_config_with_roots(
    roots: rustls::RootCertStore,
) -> Result<rustls::ClientConfig, rustls::Error> {
    let mut config = rustls::ClientConfig::builder_with_provider(Arc::new(crypto_provider()))
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.alpn_protocols = vec![NTS_KE_ALPN.to_vec()];
    Ok(config)
}

/// The configuration to use for one session: the caller's trust policy when
/// given (with the NTS-KE ALPN identifier added if it has none), otherwise
/// [`nts_client_config`].
pub(crate) fn session_config(
    supplied: Option<&Arc<rustls::ClientConfig>>,
) -> Result<Arc<rustls::ClientConfig>, rustls::Error> {
    match supplied {
        Some(config) if !config.alpn_protocols.is_empty() => Ok(Arc::clone(config)),
        Some(config) => {
            let mut config = rustls::ClientConfig::clone(config);
            config.alpn_protocols = vec![NTS_KE_ALPN.to_vec()];
            Ok(Arc::new(config))
        }
        None => nts_client_config().map(Arc::new),
    }
}
