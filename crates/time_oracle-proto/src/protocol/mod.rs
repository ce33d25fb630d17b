// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! NTPv4 header types and their network-endian codec.
//!
//! [`ReadBytes`] and [`WriteBytes`] extend the byteorder `ReadBytesExt` and
//! `WriteBytesExt` traits so that any reader or writer can move protocol
//! types on and off the wire. Field semantics follow RFC 5905.

/// Default NTP server port.
pub const PORT: u16 = 123;

/// Maximum poll exponent (2^17 s, about 36 h).
///
/// A server whose transmit time is further than this from its own reference
/// time has not been synchronized recently enough to be trusted.
pub const MAXPOLL: u8 = 17;

/// Maximum root distance in seconds.
pub const MAXDISP: f64 = 16.0;

/// First stratum value that marks a server as unsynchronized.
pub const MAXSTRAT: u8 = 16;

mod io;
mod traits;
mod types;

pub use self::traits::*;
pub use self::types::*;
