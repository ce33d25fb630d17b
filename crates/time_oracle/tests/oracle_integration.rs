// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! End-to-end acquisitions against loopback NTP responders.

mod common;

use std::time::Duration;

use oracle_proto::protocol;
use time_oracle::{AcquisitionOutcome, Oracle, OracleConfig, Response, SourceError};

fn oracle_for(ntp_list: std::path::PathBuf, nts_list: std::path::PathBuf) -> Oracle {
    Oracle::new(
        OracleConfig::builder()
            .ntp_list(ntp_list)
            .nts_list(nts_list)
            .timeout(Duration::from_millis(500))
            .build(),
    )
}

#[test]
fn test_get_time_ntp_falls_back_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let kod = common::spawn_ntp_responder(1, |reply| {
        reply.stratum = protocol::Stratum::UNSPECIFIED;
        reply.reference_id = protocol::ReferenceIdentifier(*b"DENY");
    });
    let good = common::spawn_ntp_responder(1, |_| {});
    let list = common::write_list(
        &dir,
        "ntp.txt",
        &[
            "bad.example|123456".to_string(),
            common::line_for(common::closed_port()),
            common::line_for(kod),
            common::line_for(good),
            "never.asked.example".to_string(),
        ],
    );
    let oracle = oracle_for(list.clone(), dir.path().join("nts.txt"));

    match oracle.acquire_plain() {
        AcquisitionOutcome::Success(response) => {
            assert_eq!(response.endpoint, common::line_for(good));
            assert!(!response.authenticated);
            assert!(response.clock_offset.num_seconds().abs() < 2);
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[test]
fn test_get_time_ntp_payload_format() {
    let dir = tempfile::tempdir().unwrap();
    let good = common::spawn_ntp_responder(1, |_| {});
    let list = common::write_list(&dir, "ntp.txt", &[common::line_for(good)]);
    let oracle = oracle_for(list, dir.path().join("nts.txt"));

    let Response::Success(payload) = oracle.invoke("GetTimeNtp") else {
        panic!("expected success");
    };
    let text = String::from_utf8(payload).unwrap();
    // 2025-03-01 12:00:00.123456789 +0000 UTC
    let bytes = text.as_bytes();
    assert_eq!(bytes.len(), 39, "{text}");
    for (i, b) in bytes.iter().enumerate() {
        match i {
            4 | 7 => assert_eq!(*b, b'-'),
            10 | 29 => assert_eq!(*b, b' '),
            13 | 16 => assert_eq!(*b, b':'),
            19 => assert_eq!(*b, b'.'),
            30..=39 => {}
            _ => assert!(b.is_ascii_digit(), "{text}"),
        }
    }
    assert!(text.ends_with(" +0000 UTC"));
}

#[test]
fn test_unparseable_only_list_exhausts() {
    let dir = tempfile::tempdir().unwrap();
    let list = common::write_list(&dir, "ntp.txt", &["host.example|123456".to_string()]);
    let oracle = oracle_for(list, dir.path().join("nts.txt"));

    match oracle.acquire_plain() {
        AcquisitionOutcome::Exhausted(report) => {
            assert_eq!(report.parse_failures, 1);
            assert_eq!(report.attempts, 0);
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(
        oracle.get_time_ntp(),
        Response::Error("Failed to get response from NTP servers, see log file".into())
    );
}

#[test]
fn test_every_server_failing_exhausts() {
    let dir = tempfile::tempdir().unwrap();
    let stale = common::spawn_ntp_responder(1, |reply| {
        reply.leap_indicator = protocol::LeapIndicator::Unknown;
    });
    let list = common::write_list(
        &dir,
        "ntp.txt",
        &[common::line_for(common::closed_port()), common::line_for(stale)],
    );
    let oracle = oracle_for(list, dir.path().join("nts.txt"));

    match oracle.acquire_plain() {
        AcquisitionOutcome::Exhausted(report) => {
            assert_eq!(report.attempts, 2);
            assert_eq!(report.transport_failures, 1);
            assert_eq!(report.validation_failures, 1);
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[test]
fn test_missing_and_empty_lists_are_configuration_errors() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("nts.txt");
    std::fs::File::create(&empty).unwrap();
    let oracle = oracle_for(dir.path().join("missing.txt"), empty);

    assert!(matches!(
        oracle.acquire_plain(),
        AcquisitionOutcome::ConfigurationError(SourceError::Missing { .. })
    ));
    assert!(matches!(
        oracle.acquire_authenticated(),
        AcquisitionOutcome::ConfigurationError(SourceError::Empty { .. })
    ));
    assert_eq!(
        oracle.invoke("GetTimeNtp"),
        Response::Error("error in servers list, see log file".into())
    );
    assert_eq!(
        oracle.invoke("GetTimeNts"),
        Response::Error("error in servers list, see log".into())
    );
}

#[test]
fn test_nts_list_with_refused_key_exchange_exhausts() {
    let dir = tempfile::tempdir().unwrap();
    // Nothing listens on this TCP port.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let list = common::write_list(&dir, "nts.txt", &[format!("127.0.0.1|{port}")]);
    let oracle = oracle_for(dir.path().join("ntp.txt"), list);

    assert_eq!(
        oracle.get_time_nts(),
        Response::Error("Failed to get response from NTS servers, see log file".into())
    );
}
