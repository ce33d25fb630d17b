// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Ordered fallback over a server list: first trusted answer wins.

use std::io::BufRead;

use oracle_client::{Endpoint, FailureKind, TimeQuery, TimeResponse};
use tracing::{info, warn};

/// Counters for one scan, reported in the exhaustion log line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScanReport {
    /// Lines read, including ones that failed to parse.
    pub lines: usize,
    /// Lines skipped because they did not parse.
    pub parse_failures: usize,
    /// Queries issued.
    pub attempts: usize,
    /// Attempts that failed in transport (I/O, timeout, unusable reply).
    pub transport_failures: usize,
    /// Attempts whose reply failed a sanity rule.
    pub validation_failures: usize,
    /// Attempts that failed certificate, negotiation or authentication.
    pub trust_failures: usize,
}

impl ScanReport {
    fn record(&mut self, kind: FailureKind) {
        match kind {
            FailureKind::Parse => self.parse_failures += 1,
            FailureKind::Transport => self.transport_failures += 1,
            FailureKind::Validation => self.validation_failures += 1,
            FailureKind::Trust => self.trust_failures += 1,
        }
    }

    /// Attempts that did not produce a time.
    pub fn failed_attempts(&self) -> usize {
        self.transport_failures + self.validation_failures + self.trust_failures
    }
}

/// How a scan ended.
#[derive(Clone, Debug)]
pub enum ScanOutcome {
    /// An endpoint answered and its reply was trusted.
    Succeeded(TimeResponse, ScanReport),
    /// The list ran out, or became unreadable, without a trusted answer.
    Exhausted(ScanReport),
}

impl ScanOutcome {
    /// The counters, whichever way the scan ended.
    pub fn report(&self) -> &ScanReport {
        match self {
            ScanOutcome::Succeeded(_, report) | ScanOutcome::Exhausted(report) => report,
        }
    }
}

/// Walk `lines` in order, querying each endpoint once with `client`.
///
/// Unparseable lines are logged and skipped without counting as attempts.
/// The first successful query ends the scan and no further lines are read.
/// A read error or invalid UTF-8 ends the scan as exhausted. `label` names
/// the list in log output.
pub fn scan<R, Q>(lines: R, client: &Q, label: &str) -> ScanOutcome
where
    R: BufRead,
    Q: TimeQuery + ?Sized,
{
    let mut report = ScanReport::default();

    for (index, line) in lines.lines().enumerate() {
        let line_no = index + 1;
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(list = label, line = line_no, error = %e, "unreadable server list line");
                break;
            }
        };
        report.lines += 1;

        let endpoint = match Endpoint::parse(&line) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                report.record(FailureKind::Parse);
                warn!(
                    list = label,
                    line = line_no,
                    kind = %FailureKind::Parse,
                    reason = %e,
                    "skipping server list line"
                );
                continue;
            }
        };

        report.attempts += 1;
        match client.query(&endpoint) {
            Ok(response) => {
                info!(
                    list = label,
                    line = line_no,
                    %endpoint,
                    stratum = response.stratum,
                    offset = %response.clock_offset,
                    delay = %response.round_trip,
                    authenticated = response.authenticated,
                    "time acquired"
                );
                return ScanOutcome::Succeeded(response, report);
            }
            Err(e) => {
                let kind = e.kind();
                report.record(kind);
                if e.is_tampering() {
                    warn!(
                        list = label,
                        line = line_no,
                        %endpoint,
                        %kind,
                        reason = %e,
                        "reply failed authentication, possible tampering"
                    );
                } else {
                    warn!(
                        list = label,
                        line = line_no,
                        %endpoint,
                        %kind,
                        reason = %e,
                        "time query failed"
                    );
                }
            }
        }
    }

    info!(list = label, lines = report.lines, "end of server list");
    ScanOutcome::Exhausted(report)
}
