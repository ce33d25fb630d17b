// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The acquisition facade and the host call contract.

use std::path::Path;

use oracle_client::{NtsClient, PlainClient, TimeQuery, TimeResponse};
use tracing::{error, info, warn};

use crate::config::OracleConfig;
use crate::scan::{self, ScanOutcome, ScanReport};
use crate::source::{self, SourceError};

/// Host function name for a plain NTP acquisition.
pub const GET_TIME_NTP: &str = "GetTimeNtp";

/// Host function name for an NTS acquisition.
pub const GET_TIME_NTS: &str = "GetTimeNts";

const INVALID_FUNCTION: &str = "Invalid function name.";
const NTP_LIST_ERROR: &str = "error in servers list, see log file";
const NTS_LIST_ERROR: &str = "error in servers list, see log";
const NTP_EXHAUSTED: &str = "Failed to get response from NTP servers, see log file";
const NTS_EXHAUSTED: &str = "Failed to get response from NTS servers, see log file";

/// The result of one acquisition call.
#[derive(Debug)]
pub enum AcquisitionOutcome {
    /// A trusted time was obtained.
    Success(TimeResponse),
    /// Every endpoint in the list failed.
    Exhausted(ScanReport),
    /// The list was refused before any query was made.
    ConfigurationError(SourceError),
}

/// What the host receives: a payload or a short message. Details stay in
/// the log.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Response {
    /// Success with a payload.
    Success(Vec<u8>),
    /// Failure with a message for the caller.
    Error(String),
}

impl Response {
    /// Whether this is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }
}

/// Acquires trusted time from the configured server lists.
///
/// Holds only immutable configuration; every call starts from scratch.
#[derive(Clone, Debug, Default)]
pub struct Oracle {
    config: OracleConfig,
}

impl Oracle {
    /// Create an oracle with `config`.
    pub fn new(config: OracleConfig) -> Self {
        Oracle { config }
    }

    /// Host initialization hook. There is no state to set up.
    pub fn init(&self) -> Response {
        Response::Success(Vec::new())
    }

    /// Dispatch a host function by name.
    pub fn invoke(&self, function: &str) -> Response {
        match function {
            GET_TIME_NTP => self.get_time_ntp(),
            GET_TIME_NTS => self.get_time_nts(),
            other => {
                warn!(function = other, "invalid function name");
                Response::Error(INVALID_FUNCTION.to_string())
            }
        }
    }

    /// Plain NTP acquisition, mapped to a host response.
    pub fn get_time_ntp(&self) -> Response {
        respond(self.acquire_plain(), NTP_LIST_ERROR, NTP_EXHAUSTED)
    }

    /// NTS acquisition, mapped to a host response.
    pub fn get_time_nts(&self) -> Response {
        respond(self.acquire_authenticated(), NTS_LIST_ERROR, NTS_EXHAUSTED)
    }

    /// Scan the plain NTP list until one server answers acceptably.
    pub fn acquire_plain(&self) -> AcquisitionOutcome {
        let client = PlainClient::new(self.config.query.clone());
        self.acquire_with(&self.config.ntp_list, &client)
    }

    /// Scan the NTS list until one server answers with an authenticated,
    /// acceptable reply.
    pub fn acquire_authenticated(&self) -> AcquisitionOutcome {
        let client = NtsClient::new(self.config.session.clone(), self.config.query.clone());
        self.acquire_with(&self.config.nts_list, &client)
    }

    /// Admit `list` and scan it with `client`.
    pub fn acquire_with<Q: TimeQuery + ?Sized>(&self, list: &Path, client: &Q) -> AcquisitionOutcome {
        let label = list.display().to_string();
        let reader = match source::open_source(list, self.config.max_source_bytes) {
            Ok(reader) => reader,
            Err(e) => {
                error!(list = %label, error = %e, "server list refused");
                return AcquisitionOutcome::ConfigurationError(e);
            }
        };

        match scan::scan(reader, client, &label) {
            ScanOutcome::Succeeded(response, report) => {
                info!(list = %label, attempts = report.attempts, time = %response, "acquisition succeeded");
                AcquisitionOutcome::Success(response)
            }
            ScanOutcome::Exhausted(report) => {
                error!(
                    list = %label,
                    lines = report.lines,
                    parse_failures = report.parse_failures,
                    attempts = report.attempts,
                    transport_failures = report.transport_failures,
                    validation_failures = report.validation_failures,
                    trust_failures = report.trust_failures,
                    "no server in the list produced a trusted time"
                );
                AcquisitionOutcome::Exhausted(report)
            }
        }
    }
}

fn respond(outcome: AcquisitionOutcome, list_error: &str, exhausted: &str) -> Response {
    match outcome {
        AcquisitionOutcome::Success(response) => Response::Success(response.to_string().into_bytes()),
        AcquisitionOutcome::ConfigurationError(_) => Response::Error(list_error.to_string()),
        AcquisitionOutcome::Exhausted(_) => Response::Error(exhausted.to_string()),
    }
}
