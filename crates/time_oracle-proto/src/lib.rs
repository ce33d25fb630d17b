// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Wire-level building blocks for the time oracle.
//!
//! This crate encodes and decodes the NTPv4 packet header (RFC 5905), the
//! extension fields carried after it (RFC 7822), and the records and
//! authenticators of Network Time Security (RFC 8915). It performs no I/O:
//! sockets, TLS sessions, and clocks are the client crate's concern.

#![warn(missing_docs)]

/// Errors produced while decoding or encoding wire data.
pub mod error;

/// NTP extension fields and the NTS field types.
pub mod extension;

/// NTPv4 header types, constants, and the big-endian codec.
pub mod protocol;

/// Conversion between NTP timestamps and Unix instants.
pub mod unix_time;

/// NTS-KE record framing, AEAD helpers, and authenticated packet building.
#[cfg(feature = "nts")]
pub mod nts_common;
