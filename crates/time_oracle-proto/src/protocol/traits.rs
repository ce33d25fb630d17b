// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io;

/// Writes any protocol type to network-endian bytes.
///
/// Blanket-implemented for every `byteorder::WriteBytesExt`.
pub trait WriteBytes {
    /// Writes `protocol` to this writer in network byte order.
    fn write_bytes<P: WriteToBytes>(&mut self, protocol: P) -> io::Result<()>;
}

/// Reads any protocol type from network-endian bytes.
///
/// Blanket-implemented for every `byteorder::ReadBytesExt`.
pub trait ReadBytes {
    /// Reads a protocol type from this reader in network byte order.
    fn read_bytes<P: ReadFromBytes>(&mut self) -> io::Result<P>;
}

/// Protocol types that can be written as network-endian bytes.
pub trait WriteToBytes {
    /// Write the value to `writer`.
    fn write_to_bytes<W: WriteBytesExt>(&self, writer: W) -> io::Result<()>;
}

/// Protocol types that can be read from network-endian bytes.
pub trait ReadFromBytes: Sized {
    /// Read the value from `reader`.
    fn read_from_bytes<R: ReadBytesExt>(reader: R) -> io::Result<Self>;
}

/// Types with a fixed encoded size.
pub trait ConstPackedSizeBytes {
    /// Encoded size in bytes.
    const PACKED_SIZE_BYTES: usize;
}
