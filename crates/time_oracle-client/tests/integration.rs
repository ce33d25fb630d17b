// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Plain NTP queries against a loopback responder, plus opt-in checks
//! against public servers.

mod common;

use std::time::Duration;

use oracle_client::protocol;
use oracle_client::{
    Endpoint, FailureKind, PlainClient, ProtocolError, QueryError, QueryOptions, TimeQuery,
    ValidationError,
};

fn client() -> PlainClient {
    PlainClient::new(QueryOptions {
        timeout: Duration::from_secs(2),
        ..QueryOptions::default()
    })
}

fn endpoint_for(addr: std::net::SocketAddr) -> Endpoint {
    Endpoint::new(addr.ip().to_string(), Some(addr.port()))
}

#[test]
fn test_plain_query_local_responder() {
    let addr = common::spawn_responder(|req| Some(common::encode(common::server_reply(req))));
    let response = client().query(&endpoint_for(addr)).unwrap();

    assert!(!response.authenticated);
    assert_eq!(response.stratum, 2);
    assert_eq!(response.endpoint, format!("127.0.0.1|{}", addr.port()));
    assert!(response.clock_offset.num_seconds().abs() < 2);
    assert!(response.round_trip >= chrono::TimeDelta::zero());

    // "YYYY-MM-DD hh:mm:ss.nnnnnnnnn +0000 UTC"
    let text = response.to_string();
    assert_eq!(text.len(), 39, "{text}");
    assert!(text.ends_with(" +0000 UTC"), "{text}");
    assert_eq!(&text[19..20], ".");
}

#[test]
fn test_plain_query_origin_mismatch_is_transport() {
    let addr = common::spawn_responder(|req| {
        let mut reply = common::server_reply(req);
        reply.origin_timestamp.fraction ^= 1;
        Some(common::encode(reply))
    });
    let err = client().query(&endpoint_for(addr)).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Protocol(ProtocolError::OriginTimestampMismatch)
    ));
    assert_eq!(err.kind(), FailureKind::Transport);
    assert!(!err.is_tampering());
}

#[test]
fn test_plain_query_short_reply() {
    let addr = common::spawn_responder(|req| {
        let mut reply = common::encode(common::server_reply(req));
        reply.truncate(40);
        Some(reply)
    });
    let err = client().query(&endpoint_for(addr)).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Protocol(ProtocolError::ResponseTooShort { received: 40 })
    ));
}

#[test]
fn test_plain_query_kiss_of_death() {
    let addr = common::spawn_responder(|req| {
        let mut reply = common::server_reply(req);
        reply.stratum = protocol::Stratum::UNSPECIFIED;
        reply.reference_id = protocol::ReferenceIdentifier(*b"RATE");
        Some(common::encode(reply))
    });
    let err = client().query(&endpoint_for(addr)).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Validation);
    assert!(matches!(
        err,
        QueryError::Validation(ValidationError::KissOfDeath { ref code }) if code == "RATE"
    ));
}

#[test]
fn test_plain_query_unsynchronized_server() {
    let addr = common::spawn_responder(|req| {
        let mut reply = common::server_reply(req);
        reply.leap_indicator = protocol::LeapIndicator::Unknown;
        Some(common::encode(reply))
    });
    let err = client().query(&endpoint_for(addr)).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Validation(ValidationError::Unsynchronized)
    ));
}

#[test]
fn test_plain_query_silent_server_times_out() {
    let addr = common::spawn_responder(|_| None);
    let client = PlainClient::new(QueryOptions {
        timeout: Duration::from_millis(200),
        ..QueryOptions::default()
    });
    let err = client.query(&endpoint_for(addr)).unwrap_err();
    assert!(matches!(err, QueryError::Io(_)), "{err}");
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[test]
fn test_cloudflare_time_server() {
    if !common::is_network_available() {
        eprintln!("Skipping network test (SKIP_NETWORK_TESTS set)");
        return;
    }

    let endpoint: Endpoint = "time.cloudflare.com".parse().unwrap();
    match client().query(&endpoint) {
        Ok(response) => {
            println!("Cloudflare: {response} offset={}", response.clock_offset);
            assert!(response.clock_offset.num_seconds().abs() < 5);
            assert!(response.stratum >= 1 && response.stratum < 16);
        }
        Err(e) if common::is_query_skip_error(&e) => {
            eprintln!("Skipping Cloudflare test: network unreachable ({e})");
        }
        Err(e) => panic!("Unexpected error from time.cloudflare.com: {e}"),
    }
}
