// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! NTS integration tests.
//!
//! The authenticated exchange is driven against a loopback responder that
//! holds the session keys; key establishment is exercised against public
//! NTS servers when the network allows.

mod common;

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use oracle_client::extension::{
    self, ExtensionField, NTS_AUTHENTICATOR, NTS_COOKIE, NtsAuthenticator, UNIQUE_IDENTIFIER,
};
use oracle_client::nts_common::{
    AEAD_AES_SIV_CMAC_256, NtsKeResult, NtsProtoError, aead_decrypt, aead_encrypt,
};
use oracle_client::nts::nts_ke;
use oracle_client::{
    AuthenticityError, Endpoint, FailureKind, NtsClient, NtsSession, QueryError, QueryOptions,
    SecureSessionOptions, TimeQuery, TrustError,
};

const C2S_KEY: [u8; 32] = [0x11; 32];
const S2C_KEY: [u8; 32] = [0x22; 32];
const HEADER_LEN: usize = 48;

fn session_for(addr: SocketAddr) -> NtsSession {
    NtsSession::from_ke_result(NtsKeResult {
        c2s_key: C2S_KEY.to_vec(),
        s2c_key: S2C_KEY.to_vec(),
        cookies: vec![vec![0xC0; 64]],
        aead_algorithm: AEAD_AES_SIV_CMAC_256,
        ntp_server: addr.ip().to_string(),
        ntp_port: addr.port(),
    })
    .unwrap()
}

fn opts() -> QueryOptions {
    QueryOptions {
        timeout: Duration::from_secs(2),
        ..QueryOptions::default()
    }
}

// What the responder saw in the request: its Unique Identifier, and whether
// the request authenticator verified under the c2s key.
fn open_request(request: &[u8]) -> (Vec<u8>, bool) {
    let fields = extension::parse_extension_fields(&request[HEADER_LEN..]).unwrap();
    let uid = fields
        .iter()
        .find(|(_, ef)| ef.field_type == UNIQUE_IDENTIFIER)
        .map(|(_, ef)| ef.value.clone())
        .unwrap();
    let (offset, auth_ef) = fields
        .iter()
        .find(|(_, ef)| ef.field_type == NTS_AUTHENTICATOR)
        .unwrap();
    let auth = NtsAuthenticator::from_extension_field(auth_ef)
        .unwrap()
        .unwrap();
    let verified = aead_decrypt(
        AEAD_AES_SIV_CMAC_256,
        &C2S_KEY,
        &request[..HEADER_LEN + offset],
        &auth.nonce,
        &auth.ciphertext,
    )
    .is_ok();
    (uid, verified)
}

// Header, echoed identifier, then an authenticator sealing one fresh cookie.
fn sealed_reply(request: &[u8], uid: &[u8]) -> Vec<u8> {
    let mut buf = common::encode(common::server_reply(request));
    buf.extend_from_slice(&extension::write_extension_fields(&[
        ExtensionField::unique_identifier(uid),
    ]));
    let plaintext = extension::write_extension_fields(&[ExtensionField::cookie(&[0xC1; 64])]);
    let (nonce, ct) = aead_encrypt(AEAD_AES_SIV_CMAC_256, &S2C_KEY, &buf, &plaintext).unwrap();
    let auth = NtsAuthenticator::new(nonce, ct).to_extension_field();
    buf.extend_from_slice(&extension::write_extension_fields(&[auth]));
    buf
}

#[test]
fn test_nts_query_local_responder() {
    let (tx, rx) = std::sync::mpsc::channel();
    let addr = common::spawn_responder(move |req| {
        let (uid, verified) = open_request(req);
        tx.send(verified).unwrap();
        Some(sealed_reply(req, &uid))
    });

    let mut session = session_for(addr);
    let response = session.query(&opts()).unwrap();

    assert!(rx.recv().unwrap(), "request authenticator did not verify");
    assert!(response.authenticated);
    assert_eq!(response.stratum, 2);
    assert!(response.clock_offset.num_seconds().abs() < 2);
    // One cookie spent, one received inside the encrypted fields.
    assert_eq!(session.cookie_count(), 1);
}

#[test]
fn test_nts_query_corrupted_tag_is_tampering() {
    let addr = common::spawn_responder(|req| {
        let (uid, _) = open_request(req);
        let mut reply = sealed_reply(req, &uid);
        // The last bytes belong to the ciphertext; cookie length 64 keeps
        // the field free of trailing padding.
        let last = reply.len() - 1;
        reply[last] ^= 0xFF;
        Some(reply)
    });

    let err = session_for(addr).query(&opts()).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Trust);
    assert!(err.is_tampering());
    assert!(matches!(
        err,
        QueryError::Trust(TrustError::Authenticity(AuthenticityError::Nts(
            NtsProtoError::AeadDecryptFailed
        )))
    ));
}

#[test]
fn test_nts_query_wrong_identifier_is_tampering() {
    let addr = common::spawn_responder(|req| Some(sealed_reply(req, &[0u8; 32])));

    let err = session_for(addr).query(&opts()).unwrap_err();
    assert!(err.is_tampering());
    assert!(matches!(
        err,
        QueryError::Trust(TrustError::Authenticity(AuthenticityError::Nts(
            NtsProtoError::UniqueIdentifierMismatch
        )))
    ));
}

#[test]
fn test_nts_query_unauthenticated_reply_is_tampering() {
    // A well-formed plain NTP reply with no NTS fields at all.
    let addr = common::spawn_responder(|req| Some(common::encode(common::server_reply(req))));

    let err = session_for(addr).query(&opts()).unwrap_err();
    assert!(err.is_tampering());
}

#[test]
fn test_nts_query_origin_mismatch_is_tampering() {
    let addr = common::spawn_responder(|req| {
        let (uid, _) = open_request(req);
        let mut reply = sealed_reply(req, &uid);
        reply[24..32].copy_from_slice(&[0xAB; 8]);
        Some(reply)
    });

    let err = session_for(addr).query(&opts()).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Trust(TrustError::Authenticity(
            AuthenticityError::OriginTimestampMismatch
        ))
    ));
}

#[test]
fn test_nts_cookies_in_plain_fields_are_ignored_after_authenticator() {
    let addr = common::spawn_responder(|req| {
        let (uid, _) = open_request(req);
        let mut reply = sealed_reply(req, &uid);
        reply.extend_from_slice(&extension::write_extension_fields(&[ExtensionField {
            field_type: NTS_COOKIE,
            value: vec![0xEE; 64],
        }]));
        Some(reply)
    });

    let mut session = session_for(addr);
    session.query(&opts()).unwrap();
    assert_eq!(session.cookie_count(), 1);
}

// A TLS 1.3 key establishment listener on loopback holding a self-signed
// certificate no public root vouches for. Serves one handshake.
fn spawn_untrusted_ke_server() -> u16 {
    use rustls::pki_types::PrivatePkcs8KeyDer;

    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let key = PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der());
    let mut config =
        rustls::ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_protocol_versions(&[&rustls::version::TLS13])
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(vec![cert.cert.der().clone()], key.into())
            .unwrap();
    config.alpn_protocols = vec![b"ntske/1".to_vec()];
    let config = Arc::new(config);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    std::thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut conn = rustls::ServerConnection::new(config).unwrap();
        while conn.is_handshaking() {
            if conn.complete_io(&mut stream).is_err() {
                break;
            }
        }
    });
    port
}

#[test]
fn test_nts_ke_untrusted_certificate_is_trust_failure() {
    let port = spawn_untrusted_ke_server();
    let session = SecureSessionOptions {
        timeout: Duration::from_secs(2),
        ..SecureSessionOptions::default()
    };

    let err = nts_ke(&format!("localhost:{port}"), &session, &opts()).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Trust, "{err}");
    assert!(!err.is_tampering());
    assert!(
        matches!(err, QueryError::Trust(TrustError::Certificate(_))),
        "{err}"
    );
}

#[test]
fn test_cloudflare_nts() {
    if !common::is_network_available() {
        eprintln!("Skipping network test (SKIP_NETWORK_TESTS set)");
        return;
    }

    let client = NtsClient::new(
        SecureSessionOptions {
            timeout: Duration::from_secs(10),
            ..SecureSessionOptions::default()
        },
        QueryOptions {
            timeout: Duration::from_secs(10),
            ..QueryOptions::default()
        },
    );
    let endpoint: Endpoint = "time.cloudflare.com".parse().unwrap();
    match client.query(&endpoint) {
        Ok(response) => {
            println!("Cloudflare NTS: {response}");
            assert!(response.authenticated);
            assert_eq!(response.endpoint, "time.cloudflare.com");
            assert!(response.clock_offset.num_seconds().abs() < 5);
        }
        Err(e) if common::is_query_skip_error(&e) => {
            eprintln!("Skipping Cloudflare NTS test: network unreachable ({e})");
        }
        Err(e) => panic!("Unexpected NTS error from time.cloudflare.com: {e}"),
    }
}
