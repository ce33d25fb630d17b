// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! [`ParseError`] describes malformed wire data. It converts into
//! [`std::io::Error`] so codec functions can keep returning `io::Result`
//! while callers still downcast to the typed error.

use std::fmt;
use std::io;

/// Errors that can occur while decoding NTP or NTS wire data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The buffer is too short for the expected data.
    BufferTooShort {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },
    /// A packed field carried a value outside its defined range.
    InvalidField {
        /// Name of the field.
        field: &'static str,
        /// The offending value.
        value: u32,
    },
    /// An extension field declared a length shorter than its own header.
    InvalidExtensionLength {
        /// The declared length.
        declared: u16,
    },
    /// An extension field value runs past the end of the packet.
    ExtensionOverflow,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BufferTooShort { needed, available } => {
                write!(f, "buffer too short: needed {needed} bytes, got {available}")
            }
            ParseError::InvalidField { field, value } => {
                write!(f, "invalid {field} value: {value}")
            }
            ParseError::InvalidExtensionLength { declared } => {
                write!(f, "extension field length less than 4: {declared}")
            }
            ParseError::ExtensionOverflow => {
                write!(f, "extension field value extends beyond packet")
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for io::Error {
    fn from(err: ParseError) -> io::Error {
        let kind = match &err {
            ParseError::BufferTooShort { .. } => io::ErrorKind::UnexpectedEof,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}
