// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use super::{ConstPackedSizeBytes, MAXSTRAT};

/// **NTP Short Format**: 16-bit seconds and 16-bit fraction, used for the
/// root delay and root dispersion header fields.
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          Seconds              |           Fraction            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShortFormat {
    /// Whole seconds.
    pub seconds: u16,
    /// Fractional seconds in units of 2^-16 s.
    pub fraction: u16,
}

/// **NTP Timestamp Format**: 32-bit seconds since the era epoch and a 32-bit
/// fraction resolving about 232 picoseconds.
///
/// Era 0 begins at 0 h 1 January 1900 UTC. The era itself is not carried on
/// the wire; see [`crate::unix_time::timestamp_to_instant`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TimestampFormat {
    /// Seconds within the era.
    pub seconds: u32,
    /// Fractional seconds in units of 2^-32 s.
    pub fraction: u32,
}

/// 2-bit leap second warning. Value 3 means the server clock is not
/// synchronized.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum LeapIndicator {
    /// No leap required.
    #[default]
    NoWarning = 0,
    /// Last minute of the day has 61 seconds.
    AddOne = 1,
    /// Last minute of the day has 59 seconds.
    SubOne = 2,
    /// Clock unsynchronized.
    Unknown = 3,
}

impl TryFrom<u8> for LeapIndicator {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LeapIndicator::NoWarning),
            1 => Ok(LeapIndicator::AddOne),
            2 => Ok(LeapIndicator::SubOne),
            3 => Ok(LeapIndicator::Unknown),
            _ => Err(()),
        }
    }
}

/// 3-bit protocol version number.
///
/// Decoding accepts any 3-bit value so that a reply can be inspected; only
/// [`Version::new`] restricts construction to the versions a client may send.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Version(pub(super) u8);

impl Version {
    /// NTP version 2.
    pub const V2: Self = Version(2);
    /// NTP version 3.
    pub const V3: Self = Version(3);
    /// NTP version 4.
    pub const V4: Self = Version(4);

    /// Create a request version. Only versions 2 through 4 are accepted.
    pub fn new(v: u8) -> Option<Self> {
        if (2..=4).contains(&v) {
            Some(Version(v))
        } else {
            None
        }
    }

    /// The raw version number.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::V4
    }
}

/// 3-bit association mode.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Reserved (0).
    Reserved = 0,
    /// Symmetric active (1).
    SymmetricActive = 1,
    /// Symmetric passive (2).
    SymmetricPassive = 2,
    /// Client (3).
    #[default]
    Client = 3,
    /// Server (4).
    Server = 4,
    /// Broadcast (5).
    Broadcast = 5,
    /// NTP control message (6).
    NtpControlMessage = 6,
    /// Reserved for private use (7).
    ReservedForPrivateUse = 7,
}

impl TryFrom<u8> for Mode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Reserved),
            1 => Ok(Mode::SymmetricActive),
            2 => Ok(Mode::SymmetricPassive),
            3 => Ok(Mode::Client),
            4 => Ok(Mode::Server),
            5 => Ok(Mode::Broadcast),
            6 => Ok(Mode::NtpControlMessage),
            7 => Ok(Mode::ReservedForPrivateUse),
            _ => Err(()),
        }
    }
}

/// Distance of the server from a reference clock.
///
/// | Value  | Meaning                         |
/// |--------|---------------------------------|
/// | 0      | unspecified, or kiss-o'-death   |
/// | 1      | primary server                  |
/// | 2-15   | secondary server                |
/// | 16     | unsynchronized                  |
/// | 17-255 | reserved                        |
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Stratum(pub u8);

impl Stratum {
    /// Unspecified or invalid; replies use it to carry a kiss code.
    pub const UNSPECIFIED: Self = Stratum(0);
    /// Unsynchronized.
    pub const UNSYNCHRONIZED: Self = Stratum(MAXSTRAT);

    /// Whether the stratum is 16 or above.
    pub fn is_unsynchronized(&self) -> bool {
        *self >= Self::UNSYNCHRONIZED
    }
}

/// The 32-bit reference identifier.
///
/// For stratum 0 it holds a four-character kiss code, for stratum 1 a
/// reference clock name, and for higher strata an upstream address (or a
/// hash of one). The raw octets are kept; interpretation is on demand.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ReferenceIdentifier(pub [u8; 4]);

impl ReferenceIdentifier {
    /// The raw octets.
    pub fn as_bytes(&self) -> [u8; 4] {
        self.0
    }

    /// The identifier as left-justified ASCII with trailing NULs removed.
    /// Non-printable octets are rendered as `?`.
    pub fn to_ascii(&self) -> String {
        self.0
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '?'
                }
            })
            .collect()
    }
}

impl fmt::Display for ReferenceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii())
    }
}

/// Kiss codes that a client must act on (RFC 5905 Section 7.4).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KissOfDeath {
    /// Access denied; stop querying this server.
    Deny,
    /// Access restricted; stop querying this server.
    Rstr,
    /// Rate exceeded; reduce the polling rate.
    Rate,
}

impl TryFrom<ReferenceIdentifier> for KissOfDeath {
    type Error = ();

    fn try_from(id: ReferenceIdentifier) -> Result<Self, Self::Error> {
        match &id.0 {
            b"DENY" => Ok(KissOfDeath::Deny),
            b"RSTR" => Ok(KissOfDeath::Rstr),
            b"RATE" => Ok(KissOfDeath::Rate),
            _ => Err(()),
        }
    }
}

impl fmt::Display for KissOfDeath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            KissOfDeath::Deny => "DENY",
            KissOfDeath::Rstr => "RSTR",
            KissOfDeath::Rate => "RATE",
        };
        f.write_str(code)
    }
}

/// **Packet Header**: the 48-byte NTPv4 header. Extension fields and any MAC
/// follow it on the wire and are handled separately.
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |LI | VN  |Mode |    Stratum     |     Poll      |  Precision   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Root Delay                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Root Dispersion                       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                          Reference ID                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// +                     Reference Timestamp (64)                  +
/// +                      Origin Timestamp (64)                    +
/// +                      Receive Timestamp (64)                   +
/// +                      Transmit Timestamp (64)                  +
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Packet {
    /// Leap indicator.
    pub leap_indicator: LeapIndicator,
    /// Version number.
    pub version: Version,
    /// Association mode.
    pub mode: Mode,
    /// Stratum of the sender.
    pub stratum: Stratum,
    /// Poll exponent, log2 seconds.
    pub poll: i8,
    /// Clock precision, log2 seconds.
    pub precision: i8,
    /// Round-trip delay to the reference clock.
    pub root_delay: ShortFormat,
    /// Dispersion to the reference clock.
    pub root_dispersion: ShortFormat,
    /// Reference identifier.
    pub reference_id: ReferenceIdentifier,
    /// Time the sender's clock was last set (reftime).
    pub reference_timestamp: TimestampFormat,
    /// T1 echoed back by the server.
    pub origin_timestamp: TimestampFormat,
    /// T2: request arrival at the server.
    pub receive_timestamp: TimestampFormat,
    /// T3: reply departure from the server.
    pub transmit_timestamp: TimestampFormat,
}

/// The fields packed into the first header byte.
pub type PacketByte1 = (LeapIndicator, Version, Mode);

impl ShortFormat {
    /// The value in seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.seconds as f64 + self.fraction as f64 / 65_536.0
    }
}

impl TimestampFormat {
    /// Whether both halves are zero, which NTP uses to mean "not set".
    pub fn is_zero(&self) -> bool {
        self.seconds == 0 && self.fraction == 0
    }
}

impl Packet {
    /// The kiss code carried by a stratum 0 reply, if it is one a client
    /// must act on.
    pub fn kiss_of_death(&self) -> Option<KissOfDeath> {
        if self.stratum != Stratum::UNSPECIFIED {
            return None;
        }
        KissOfDeath::try_from(self.reference_id).ok()
    }
}

impl ConstPackedSizeBytes for ShortFormat {
    const PACKED_SIZE_BYTES: usize = 4;
}

impl ConstPackedSizeBytes for TimestampFormat {
    const PACKED_SIZE_BYTES: usize = 8;
}

impl ConstPackedSizeBytes for Stratum {
    const PACKED_SIZE_BYTES: usize = 1;
}

impl ConstPackedSizeBytes for ReferenceIdentifier {
    const PACKED_SIZE_BYTES: usize = 4;
}

impl ConstPackedSizeBytes for PacketByte1 {
    const PACKED_SIZE_BYTES: usize = 1;
}

impl ConstPackedSizeBytes for Packet {
    const PACKED_SIZE_BYTES: usize = PacketByte1::PACKED_SIZE_BYTES
        + Stratum::PACKED_SIZE_BYTES
        + 2
        + ShortFormat::PACKED_SIZE_BYTES * 2
        + ReferenceIdentifier::PACKED_SIZE_BYTES
        + TimestampFormat::PACKED_SIZE_BYTES * 4;
}
