// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Conversion between 64-bit NTP timestamps and Unix instants.
//!
//! An NTP timestamp only carries 32 bits of seconds, so the era it belongs
//! to has to be inferred. [`timestamp_to_instant`] picks the era that puts
//! the timestamp closest to a pivot, which for live queries is "now".

use std::time;

use crate::protocol;

/// Seconds from 1900-01-01 00:00:00 UTC to the Unix epoch.
pub const EPOCH_DELTA: i64 = 2_208_988_800;

/// Seconds in one NTP era (2^32).
pub const ERA_SECONDS: i64 = 1 << 32;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A point in time relative to the Unix epoch with nanosecond resolution.
///
/// `subsec_nanos` is always in `0..1_000_000_000`; instants before the epoch
/// have a negative `secs` and a non-negative fractional part.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Instant {
    secs: i64,
    subsec_nanos: u32,
}

impl Instant {
    /// Create an instant, carrying whole seconds out of `subsec_nanos`.
    pub fn new(secs: i64, subsec_nanos: u32) -> Instant {
        let carry = (subsec_nanos as u64 / NANOS_PER_SEC) as i64;
        Instant {
            secs: secs + carry,
            subsec_nanos: (subsec_nanos as u64 % NANOS_PER_SEC) as u32,
        }
    }

    /// The current system time.
    pub fn now() -> Self {
        match time::SystemTime::now().duration_since(time::UNIX_EPOCH) {
            Ok(d) => Instant::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                Instant::from_nanos(-(d.as_nanos() as i128))
            }
        }
    }

    /// Whole seconds since the Unix epoch (floored).
    pub fn secs(&self) -> i64 {
        self.secs
    }

    /// Nanoseconds past `secs`.
    pub fn subsec_nanos(&self) -> u32 {
        self.subsec_nanos
    }

    /// Total nanoseconds since the Unix epoch.
    pub fn as_nanos(&self) -> i128 {
        self.secs as i128 * NANOS_PER_SEC as i128 + self.subsec_nanos as i128
    }

    /// Build an instant from nanoseconds since the Unix epoch.
    pub fn from_nanos(nanos: i128) -> Self {
        let per_sec = NANOS_PER_SEC as i128;
        Instant {
            secs: nanos.div_euclid(per_sec) as i64,
            subsec_nanos: nanos.rem_euclid(per_sec) as u32,
        }
    }
}

// Select the era that places `raw_seconds` within half an era of the pivot.
fn era_aware_ntp_seconds(raw_seconds: u32, pivot: &Instant) -> i64 {
    let pivot_ntp = pivot.secs + EPOCH_DELTA;
    let pivot_era = pivot_ntp.div_euclid(ERA_SECONDS);
    let candidate = pivot_era * ERA_SECONDS + raw_seconds as i64;

    let diff = candidate - pivot_ntp;
    if diff > ERA_SECONDS / 2 {
        candidate - ERA_SECONDS
    } else if diff < -(ERA_SECONDS / 2) {
        candidate + ERA_SECONDS
    } else {
        candidate
    }
}

fn fraction_to_nanos(fraction: u32) -> u32 {
    ((fraction as u64 * NANOS_PER_SEC) >> 32) as u32
}

fn nanos_to_fraction(nanos: u32) -> u32 {
    // Round up so that converting back to nanoseconds is lossless.
    (((nanos as u64) << 32).div_ceil(NANOS_PER_SEC)) as u32
}

/// Convert a timestamp to an [`Instant`], resolving the era against `pivot`.
pub fn timestamp_to_instant(ts: protocol::TimestampFormat, pivot: &Instant) -> Instant {
    let ntp_secs = era_aware_ntp_seconds(ts.seconds, pivot);
    Instant::new(ntp_secs - EPOCH_DELTA, fraction_to_nanos(ts.fraction))
}

impl From<Instant> for protocol::TimestampFormat {
    /// Truncates to the 32-bit era offset used on the wire.
    fn from(t: Instant) -> Self {
        let ntp_secs = t.secs + EPOCH_DELTA;
        protocol::TimestampFormat {
            seconds: ntp_secs.rem_euclid(ERA_SECONDS) as u32,
            fraction: nanos_to_fraction(t.subsec_nanos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_carries_excess_nanos() {
        let i = Instant::new(5, 2_500_000_000);
        assert_eq!(i.secs(), 7);
        assert_eq!(i.subsec_nanos(), 500_000_000);
    }

    #[test]
    fn test_nanos_conversion_negative() {
        let i = Instant::from_nanos(-1);
        assert_eq!(i.secs(), -1);
        assert_eq!(i.subsec_nanos(), 999_999_999);
        assert_eq!(i.as_nanos(), -1);
    }

    #[test]
    fn test_era0_timestamp_to_instant() {
        // 2024-01-01 00:00:00 UTC: Unix=1704067200, NTP=3913056000
        let ts = protocol::TimestampFormat {
            seconds: 3_913_056_000,
            fraction: 0,
        };
        let pivot = Instant::new(1_704_067_200, 0);
        assert_eq!(timestamp_to_instant(ts, &pivot).secs(), 1_704_067_200);
    }

    #[test]
    fn test_era_boundary_pivot_before_rollover() {
        // Pivot in Jan 2036 (era 0). A small timestamp belongs to era 1.
        let pivot = Instant::new(2_082_758_400, 0);
        let ts = protocol::TimestampFormat {
            seconds: 1000,
            fraction: 0,
        };
        let expected = ERA_SECONDS + 1000 - EPOCH_DELTA;
        assert_eq!(timestamp_to_instant(ts, &pivot).secs(), expected);
    }

    #[test]
    fn test_era_boundary_pivot_after_rollover() {
        // Pivot in Mar 2036 (era 1). A timestamp near u32::MAX belongs to era 0.
        let pivot = Instant::new(2_087_942_400, 0);
        let ts = protocol::TimestampFormat {
            seconds: u32::MAX,
            fraction: 0,
        };
        let expected = u32::MAX as i64 - EPOCH_DELTA;
        assert_eq!(timestamp_to_instant(ts, &pivot).secs(), expected);
    }

    #[test]
    fn test_half_second_fraction() {
        let ts = protocol::TimestampFormat {
            seconds: 3_913_056_000,
            fraction: 0x8000_0000,
        };
        let pivot = Instant::new(1_704_067_200, 0);
        assert_eq!(timestamp_to_instant(ts, &pivot).subsec_nanos(), 500_000_000);
    }

    #[test]
    fn test_instant_survives_wire_format() {
        let original = Instant::new(1_704_067_200, 123_456_789);
        let ts: protocol::TimestampFormat = original.into();
        let restored = timestamp_to_instant(ts, &original);
        assert_eq!(restored, original);
    }
}
