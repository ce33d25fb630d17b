// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/*!
Trusted wall-clock acquisition from ordered lists of NTP and NTS servers.

An [`Oracle`] reads a server list, queries each endpoint in turn, and returns
the first reply that passes validation (and, for NTS, authentication). There
is no averaging across sources and nothing is kept between calls.

# Example

```rust,no_run
use time_oracle::{Oracle, OracleConfig, Response};

let oracle = Oracle::new(OracleConfig::builder().nts_list("nts.txt").build());
match oracle.invoke("GetTimeNts") {
    Response::Success(payload) => println!("{}", String::from_utf8_lossy(&payload)),
    Response::Error(message) => eprintln!("{message}"),
}
```
*/

#![warn(missing_docs)]

/// Oracle configuration and its builder.
pub mod config;

/// The acquisition facade and host call dispatch.
pub mod oracle;

/// Ordered fallback over a server list.
pub mod scan;

/// Server list admission.
pub mod source;

pub use config::{OracleConfig, OracleConfigBuilder};
pub use oracle::{AcquisitionOutcome, Oracle, Response};
pub use scan::{ScanOutcome, ScanReport, scan};
pub use source::{MAX_SOURCE_BYTES, SourceError};
