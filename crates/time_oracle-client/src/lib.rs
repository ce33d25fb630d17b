// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/*!
Single-shot NTP and NTS query clients with response validation.

Each query performs exactly one exchange with one endpoint and either returns
a validated [`TimeResponse`] or a [`QueryError`] that says which class of
failure occurred. Nothing is cached between calls.

# Example

```rust,no_run
use oracle_client::{Endpoint, PlainClient, QueryOptions, TimeQuery};

let endpoint: Endpoint = "0.pool.ntp.org|123".parse().unwrap();
let client = PlainClient::new(QueryOptions::default());
match client.query(&endpoint) {
    Ok(response) => println!("{response}"),
    Err(e) => eprintln!("{} failure: {e}", e.kind()),
}
```
*/

#![warn(missing_docs)]

// Re-export wire types from oracle_proto for convenience.
pub use oracle_proto::{extension, nts_common, protocol, unix_time};

/// Endpoint descriptors read from server lists.
pub mod endpoint;

/// Failure taxonomy for a single query.
pub mod error;

/// Network Time Security client (RFC 8915).
///
/// Key establishment over TLS 1.3 followed by one AEAD-authenticated NTPv4
/// exchange.
pub mod nts;

/// NTS-KE request building and response negotiation.
pub mod nts_ke_exchange;

/// Per-query options shared by both clients.
pub mod options;

/// TLS configuration for NTS key establishment.
pub mod tls_config;

// Socket construction honoring TTL and local address.
mod socket;

// Plain NTPv4 query, reply checks and sanity validation.
mod request;

pub use endpoint::{Endpoint, EndpointError};
pub use error::{
    AuthenticityError, FailureKind, NegotiationError, ProtocolError, QueryError, TrustError,
    ValidationError,
};
pub use nts::{NtsClient, NtsSession};
pub use options::{QueryOptions, SecureSessionOptions};
pub use request::{PlainClient, TimeQuery, TimeResponse, query, validate_sanity};
