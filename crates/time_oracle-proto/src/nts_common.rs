// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! NTS constants, key establishment records, AEAD, and the authenticated
//! NTPv4 request/response format (RFC 8915).

use std::fmt;
use std::io;

use aes_siv::aead::{Aead, KeyInit, Payload};
use aes_siv::{Aes128SivAead, Aes256SivAead};
use byteorder::{BE, ReadBytesExt};

use crate::extension::{
    self, ExtensionField, NTS_AUTHENTICATOR, NTS_COOKIE, NtsAuthenticator, UNIQUE_IDENTIFIER,
};
use crate::protocol::{self, ConstPackedSizeBytes, WriteBytes};

/// Errors raised while sealing a request or verifying an NTS response.
///
/// Every verification variant means the reply cannot be attributed to the
/// server that holds our session keys.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NtsProtoError {
    /// The negotiated AEAD algorithm is not supported.
    UnsupportedAeadAlgorithm {
        /// The algorithm identifier.
        algorithm: u16,
    },
    /// The key has the wrong length for the algorithm.
    AeadKeyInit,
    /// Sealing the request failed.
    AeadEncryptFailed,
    /// The authentication tag did not verify.
    AeadDecryptFailed,
    /// A required extension field is absent.
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
    /// The extension fields could not be parsed.
    MalformedExtensions,
    /// The echoed Unique Identifier differs from the one we sent.
    UniqueIdentifierMismatch,
}

impl fmt::Display for NtsProtoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NtsProtoError::UnsupportedAeadAlgorithm { algorithm } => {
                write!(f, "unsupported AEAD algorithm: {algorithm}")
            }
            NtsProtoError::AeadKeyInit => write!(f, "AEAD key initialization failed"),
            NtsProtoError::AeadEncryptFailed => write!(f, "AEAD encryption failed"),
            NtsProtoError::AeadDecryptFailed => {
                write!(f, "AEAD authentication failed, response may be tampered")
            }
            NtsProtoError::MissingField { field } => write!(f, "NTS response missing {field}"),
            NtsProtoError::MalformedExtensions => {
                write!(f, "NTS response has malformed extension fields")
            }
            NtsProtoError::UniqueIdentifierMismatch => {
                write!(f, "NTS response Unique Identifier mismatch")
            }
        }
    }
}

impl std::error::Error for NtsProtoError {}

impl From<NtsProtoError> for io::Error {
    fn from(err: NtsProtoError) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

// NTS-KE record types (RFC 8915 Section 4).

/// End of Message record.
pub const NTS_KE_END_OF_MESSAGE: u16 = 0;
/// NTS Next Protocol Negotiation record.
pub const NTS_KE_NEXT_PROTOCOL: u16 = 1;
/// Error record.
pub const NTS_KE_ERROR: u16 = 2;
/// Warning record.
pub const NTS_KE_WARNING: u16 = 3;
/// AEAD Algorithm Negotiation record.
pub const NTS_KE_AEAD_ALGORITHM: u16 = 4;
/// New Cookie for NTPv4 record.
pub const NTS_KE_NEW_COOKIE: u16 = 5;
/// NTPv4 Server Negotiation record.
pub const NTS_KE_SERVER: u16 = 6;
/// NTPv4 Port Negotiation record.
pub const NTS_KE_PORT: u16 = 7;

/// Critical bit of the record type field.
pub const NTS_KE_CRITICAL_BIT: u16 = 0x8000;

/// Protocol identifier for NTPv4 in Next Protocol records.
pub const NTS_PROTOCOL_NTPV4: u16 = 0;

/// Default NTS-KE port.
pub const NTS_KE_DEFAULT_PORT: u16 = 4460;

/// ALPN identifier for NTS-KE.
pub const NTS_KE_ALPN: &[u8] = b"ntske/1";

/// AEAD_AES_SIV_CMAC_256.
pub const AEAD_AES_SIV_CMAC_256: u16 = 15;

/// AEAD_AES_SIV_CMAC_512.
pub const AEAD_AES_SIV_CMAC_512: u16 = 17;

/// TLS exporter label for NTS keys.
pub const NTS_EXPORTER_LABEL: &[u8] = b"EXPORTER-network-time-security";

/// Exporter context for the client-to-server key, given the negotiated
/// protocol and algorithm.
pub fn c2s_exporter_context(aead_algorithm: u16) -> [u8; 5] {
    exporter_context(aead_algorithm, 0x00)
}

/// Exporter context for the server-to-client key.
pub fn s2c_exporter_context(aead_algorithm: u16) -> [u8; 5] {
    exporter_context(aead_algorithm, 0x01)
}

// Protocol ID (2) || AEAD ID (2) || direction (1), RFC 8915 Section 5.1.
fn exporter_context(aead_algorithm: u16, direction: u8) -> [u8; 5] {
    let p = NTS_PROTOCOL_NTPV4.to_be_bytes();
    let a = aead_algorithm.to_be_bytes();
    [p[0], p[1], a[0], a[1], direction]
}

/// Cookie placeholders sent with each request.
pub const COOKIE_PLACEHOLDER_COUNT: usize = 7;

/// Length of the random Unique Identifier.
pub const UNIQUE_IDENTIFIER_LEN: usize = 32;

/// Outcome of a successful key establishment.
#[derive(Clone, Debug)]
pub struct NtsKeResult {
    /// Client-to-server key.
    pub c2s_key: Vec<u8>,
    /// Server-to-client key.
    pub s2c_key: Vec<u8>,
    /// Cookies, each good for one request.
    pub cookies: Vec<Vec<u8>>,
    /// Negotiated AEAD algorithm.
    pub aead_algorithm: u16,
    /// Host for the time exchange; the KE host unless redirected.
    pub ntp_server: String,
    /// Port for the time exchange.
    pub ntp_port: u16,
}

/// One NTS-KE record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NtsKeRecord {
    /// Whether the critical bit was set.
    pub critical: bool,
    /// Record type with the critical bit cleared.
    pub record_type: u16,
    /// Record body.
    pub body: Vec<u8>,
}

impl NtsKeRecord {
    /// Read one record from a stream.
    pub fn read_from<R: io::Read>(mut reader: R) -> io::Result<Self> {
        let raw_type = reader.read_u16::<BE>()?;
        let body_length = reader.read_u16::<BE>()?;
        let mut body = vec![0u8; body_length as usize];
        reader.read_exact(&mut body)?;
        Ok(NtsKeRecord {
            critical: raw_type & NTS_KE_CRITICAL_BIT != 0,
            record_type: raw_type & !NTS_KE_CRITICAL_BIT,
            body,
        })
    }

    /// The first two body bytes as a big-endian integer, if present.
    pub fn body_u16(&self) -> Option<u16> {
        match self.body.as_slice() {
            [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }
}

/// Append one NTS-KE record to `buf`.
pub fn write_ke_record(buf: &mut Vec<u8>, critical: bool, record_type: u16, body: &[u8]) {
    let raw_type = if critical {
        record_type | NTS_KE_CRITICAL_BIT
    } else {
        record_type
    };
    buf.extend_from_slice(&raw_type.to_be_bytes());
    buf.extend_from_slice(&(body.len() as u16).to_be_bytes());
    buf.extend_from_slice(body);
}

/// Key length in bytes for an AEAD algorithm.
pub fn aead_key_length(algorithm: u16) -> Result<usize, NtsProtoError> {
    match algorithm {
        AEAD_AES_SIV_CMAC_256 => Ok(32),
        AEAD_AES_SIV_CMAC_512 => Ok(64),
        _ => Err(NtsProtoError::UnsupportedAeadAlgorithm { algorithm }),
    }
}

fn seal<C: KeyInit + Aead>(
    key: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), NtsProtoError> {
    let cipher = C::new_from_slice(key).map_err(|_| NtsProtoError::AeadKeyInit)?;
    let mut nonce = [0u8; 16];
    rand::fill(&mut nonce);
    let ciphertext = cipher
        .encrypt(
            aes_siv::aead::Nonce::<C>::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| NtsProtoError::AeadEncryptFailed)?;
    Ok((nonce.to_vec(), ciphertext))
}

fn open<C: KeyInit + Aead>(
    key: &[u8],
    aad: &[u8],
    nonce: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, NtsProtoError> {
    let cipher = C::new_from_slice(key).map_err(|_| NtsProtoError::AeadKeyInit)?;
    if nonce.len() != 16 {
        return Err(NtsProtoError::AeadDecryptFailed);
    }
    cipher
        .decrypt(
            aes_siv::aead::Nonce::<C>::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| NtsProtoError::AeadDecryptFailed)
}

/// Encrypt under the negotiated algorithm with a fresh random nonce.
///
/// Returns `(nonce, ciphertext)`.
pub fn aead_encrypt(
    algorithm: u16,
    key: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), NtsProtoError> {
    match algorithm {
        AEAD_AES_SIV_CMAC_256 => seal::<Aes128SivAead>(key, aad, plaintext),
        AEAD_AES_SIV_CMAC_512 => seal::<Aes256SivAead>(key, aad, plaintext),
        _ => Err(NtsProtoError::UnsupportedAeadAlgorithm { algorithm }),
    }
}

/// Verify and decrypt under the negotiated algorithm.
pub fn aead_decrypt(
    algorithm: u16,
    key: &[u8],
    aad: &[u8],
    nonce: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, NtsProtoError> {
    match algorithm {
        AEAD_AES_SIV_CMAC_256 => open::<Aes128SivAead>(key, aad, nonce, ciphertext),
        AEAD_AES_SIV_CMAC_512 => open::<Aes256SivAead>(key, aad, nonce, ciphertext),
        _ => Err(NtsProtoError::UnsupportedAeadAlgorithm { algorithm }),
    }
}

/// A sealed request ready to send.
#[derive(Clone, Debug)]
pub struct NtsRequest {
    /// The complete datagram.
    pub datagram: Vec<u8>,
    /// The Unique Identifier the reply must echo.
    pub unique_id: Vec<u8>,
}

/// Append NTS fields to `header` and seal them with the client-to-server key.
///
/// The request carries a fresh Unique Identifier, the cookie, a set of
/// cookie placeholders, and an authenticator whose tag covers the header and
/// every preceding field.
pub fn build_nts_request(
    header: &protocol::Packet,
    c2s_key: &[u8],
    aead_algorithm: u16,
    cookie: &[u8],
) -> io::Result<NtsRequest> {
    let mut datagram = Vec::with_capacity(protocol::Packet::PACKED_SIZE_BYTES + 1024);
    datagram.write_bytes(header)?;

    let mut unique_id = vec![0u8; UNIQUE_IDENTIFIER_LEN];
    rand::fill(&mut unique_id[..]);

    let mut fields = vec![
        ExtensionField::unique_identifier(&unique_id),
        ExtensionField::cookie(cookie),
    ];
    fields.extend(
        std::iter::repeat_with(|| ExtensionField::cookie_placeholder(cookie.len()))
            .take(COOKIE_PLACEHOLDER_COUNT),
    );
    datagram.extend_from_slice(&extension::write_extension_fields(&fields));

    let (nonce, ciphertext) = aead_encrypt(aead_algorithm, c2s_key, &datagram, &[])?;
    let auth = NtsAuthenticator::new(nonce, ciphertext).to_extension_field();
    datagram.extend_from_slice(&extension::write_extension_fields(&[auth]));

    Ok(NtsRequest {
        datagram,
        unique_id,
    })
}

/// Authenticate an NTS response and return any new cookies it carries.
///
/// `datagram` is the full reply including its 48-byte header. The reply must
/// echo `unique_id` and carry an authenticator whose tag verifies under the
/// server-to-client key over everything preceding it.
pub fn verify_nts_response(
    s2c_key: &[u8],
    aead_algorithm: u16,
    unique_id: &[u8],
    datagram: &[u8],
) -> Result<Vec<Vec<u8>>, NtsProtoError> {
    let header_len = protocol::Packet::PACKED_SIZE_BYTES;
    if datagram.len() <= header_len {
        return Err(NtsProtoError::MissingField {
            field: "extension fields",
        });
    }
    let ext_data = &datagram[header_len..];
    let fields = extension::parse_extension_fields(ext_data)
        .map_err(|_| NtsProtoError::MalformedExtensions)?;

    let (auth_offset, auth_ef) = fields
        .iter()
        .find(|(_, ef)| ef.field_type == NTS_AUTHENTICATOR)
        .ok_or(NtsProtoError::MissingField {
            field: "NTS Authenticator",
        })?;

    // Only fields covered by the tag count.
    let covered = fields.iter().filter(|(offset, _)| offset < auth_offset);
    let echoed_uid = covered
        .clone()
        .find(|(_, ef)| ef.field_type == UNIQUE_IDENTIFIER)
        .ok_or(NtsProtoError::MissingField {
            field: "Unique Identifier",
        })?;
    if echoed_uid.1.value != unique_id {
        return Err(NtsProtoError::UniqueIdentifierMismatch);
    }

    let auth = NtsAuthenticator::from_extension_field(auth_ef)
        .map_err(|_| NtsProtoError::MalformedExtensions)?
        .ok_or(NtsProtoError::MalformedExtensions)?;
    let aad = &datagram[..header_len + auth_offset];
    let plaintext = aead_decrypt(aead_algorithm, s2c_key, aad, &auth.nonce, &auth.ciphertext)?;

    let mut cookies: Vec<Vec<u8>> = covered
        .filter(|(_, ef)| ef.field_type == NTS_COOKIE)
        .map(|(_, ef)| ef.value.clone())
        .collect();
    let encrypted = extension::parse_extension_fields(&plaintext)
        .map_err(|_| NtsProtoError::MalformedExtensions)?;
    cookies.extend(
        encrypted
            .into_iter()
            .filter(|(_, ef)| ef.field_type == NTS_COOKIE)
            .map(|(_, ef)| ef.value),
    );
    Ok(cookies)
}
