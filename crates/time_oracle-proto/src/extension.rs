// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! NTP extension fields (RFC 7822) and the NTS field types (RFC 8915).
//!
//! Each field is a 4-byte header followed by its value, zero-padded to a
//! 4-byte boundary:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          Field Type           |        Field Length           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! .                       Field Value (variable)                  .
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use std::io;

use crate::error::ParseError;

/// Unique Identifier extension field type.
pub const UNIQUE_IDENTIFIER: u16 = 0x0104;

/// NTS Cookie extension field type.
pub const NTS_COOKIE: u16 = 0x0204;

/// NTS Cookie Placeholder extension field type.
pub const NTS_COOKIE_PLACEHOLDER: u16 = 0x0304;

/// NTS Authenticator and Encrypted Extension Fields type.
pub const NTS_AUTHENTICATOR: u16 = 0x0404;

/// A parsed extension field together with where it sat in the buffer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtensionField {
    /// The field type code.
    pub field_type: u16,
    /// The field value without header or padding.
    pub value: Vec<u8>,
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Parse the extension fields that follow the 48-byte header.
///
/// Returns each field with its byte offset relative to the start of `data`.
/// Trailing bytes shorter than a field header are ignored.
pub fn parse_extension_fields(data: &[u8]) -> io::Result<Vec<(usize, ExtensionField)>> {
    let mut fields = Vec::new();
    let mut offset = 0usize;

    while data.len() - offset >= 4 {
        let field_type = u16::from_be_bytes([data[offset], data[offset + 1]]);
        let field_length = u16::from_be_bytes([data[offset + 2], data[offset + 3]]);
        if field_length < 4 {
            return Err(ParseError::InvalidExtensionLength {
                declared: field_length,
            }
            .into());
        }

        let value_start = offset + 4;
        let value_end = offset + field_length as usize;
        if value_end > data.len() {
            return Err(ParseError::ExtensionOverflow.into());
        }

        fields.push((
            offset,
            ExtensionField {
                field_type,
                value: data[value_start..value_end].to_vec(),
            },
        ));
        offset = (offset + padded_len(field_length as usize)).min(data.len());
    }

    Ok(fields)
}

/// Serialize extension fields, padding each to a 4-byte boundary.
///
/// The Length field covers the padding (RFC 7822 Section 3).
pub fn write_extension_fields(fields: &[ExtensionField]) -> Vec<u8> {
    let total: usize = fields.iter().map(|f| padded_len(4 + f.value.len())).sum();
    let mut buf = Vec::with_capacity(total);
    for field in fields {
        let field_length = padded_len(4 + field.value.len());
        buf.extend_from_slice(&field.field_type.to_be_bytes());
        buf.extend_from_slice(&(field_length as u16).to_be_bytes());
        buf.extend_from_slice(&field.value);
        buf.resize(buf.len() + field_length - 4 - field.value.len(), 0);
    }
    buf
}

impl ExtensionField {
    /// A Unique Identifier field carrying `data`.
    pub fn unique_identifier(data: &[u8]) -> Self {
        ExtensionField {
            field_type: UNIQUE_IDENTIFIER,
            value: data.to_vec(),
        }
    }

    /// A Cookie field carrying an opaque server cookie.
    pub fn cookie(cookie: &[u8]) -> Self {
        ExtensionField {
            field_type: NTS_COOKIE,
            value: cookie.to_vec(),
        }
    }

    /// A zero-filled Cookie Placeholder the size of one cookie.
    pub fn cookie_placeholder(size: usize) -> Self {
        ExtensionField {
            field_type: NTS_COOKIE_PLACEHOLDER,
            value: vec![0u8; size],
        }
    }
}

/// The body of an NTS Authenticator field.
///
/// ```text
/// +-------------------------------+-------------------------------+
/// |         Nonce Length          |       Ciphertext Length       |
/// +-------------------------------+-------------------------------+
/// .                 Nonce (padded to 4 octets)                    .
/// .               Ciphertext (padded to 4 octets)                 .
/// .                     Additional Padding                        .
/// +---------------------------------------------------------------+
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NtsAuthenticator {
    /// The AEAD nonce.
    pub nonce: Vec<u8>,
    /// The ciphertext, including the synthetic IV tag.
    pub ciphertext: Vec<u8>,
}

impl NtsAuthenticator {
    /// Create an authenticator from its parts.
    pub fn new(nonce: Vec<u8>, ciphertext: Vec<u8>) -> Self {
        NtsAuthenticator { nonce, ciphertext }
    }

    /// Encode as an extension field.
    pub fn to_extension_field(&self) -> ExtensionField {
        let mut value = Vec::with_capacity(
            4 + padded_len(self.nonce.len()) + padded_len(self.ciphertext.len()),
        );
        value.extend_from_slice(&(self.nonce.len() as u16).to_be_bytes());
        value.extend_from_slice(&(self.ciphertext.len() as u16).to_be_bytes());
        value.extend_from_slice(&self.nonce);
        value.resize(4 + padded_len(self.nonce.len()), 0);
        value.extend_from_slice(&self.ciphertext);
        let len = value.len();
        value.resize(len + padded_len(self.ciphertext.len()) - self.ciphertext.len(), 0);
        ExtensionField {
            field_type: NTS_AUTHENTICATOR,
            value,
        }
    }

    /// Decode from an extension field. Returns `Ok(None)` for other types.
    pub fn from_extension_field(ef: &ExtensionField) -> io::Result<Option<Self>> {
        if ef.field_type != NTS_AUTHENTICATOR {
            return Ok(None);
        }

        let data = &ef.value;
        if data.len() < 4 {
            return Err(ParseError::BufferTooShort {
                needed: 4,
                available: data.len(),
            }
            .into());
        }
        let nonce_len = u16::from_be_bytes([data[0], data[1]]) as usize;
        let ct_len = u16::from_be_bytes([data[2], data[3]]) as usize;

        let nonce_start = 4;
        let ct_start = nonce_start + padded_len(nonce_len);
        if nonce_start + nonce_len > data.len() || ct_start + ct_len > data.len() {
            return Err(ParseError::ExtensionOverflow.into());
        }

        Ok(Some(NtsAuthenticator {
            nonce: data[nonce_start..nonce_start + nonce_len].to_vec(),
            ciphertext: data[ct_start..ct_start + ct_len].to_vec(),
        }))
    }
}
