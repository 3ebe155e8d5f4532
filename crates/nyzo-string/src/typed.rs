//! Checksum-framed typed strings
//!
//! Buffer layout:
//!
//! ```text
//! [prefix (3 bytes)][length (1 byte)][content (length bytes)][checksum (4..=6 bytes)]
//! ```
//!
//! The 3 prefix bytes are the decoding of the 4-character type tag (`key_`,
//! `id__`, ...), so every encoded string starts with its readable tag. The
//! checksum is the head of `SHA-256(SHA-256(prefix || length || content))`.

use crate::codec::{decode_with, encode, DecodeMode};
use crate::NyzoStringError;
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

const PREFIX_LEN: usize = 3;
const HEADER_LEN: usize = PREFIX_LEN + 1;

/// Largest content that fits the 1-byte length field
pub const MAX_CONTENT_LEN: usize = u8::MAX as usize;

/// Type tag of a Nyzo string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NyzoStringPrefix {
    /// `key_`: private seed
    PrivateSeed,
    /// `id__`: public verifier/wallet identifier
    PublicIdentifier,
    /// `pre_`: prefilled transaction data
    PrefilledData,
    /// `pay_`: micropay transaction
    Micropay,
    /// `sig_`: signature
    Signature,
    /// `tx__`: transaction
    Transaction,
}

impl NyzoStringPrefix {
    pub const ALL: [NyzoStringPrefix; 6] = [
        NyzoStringPrefix::PrivateSeed,
        NyzoStringPrefix::PublicIdentifier,
        NyzoStringPrefix::PrefilledData,
        NyzoStringPrefix::Micropay,
        NyzoStringPrefix::Signature,
        NyzoStringPrefix::Transaction,
    ];

    /// The readable 4-character tag
    pub fn as_str(&self) -> &'static str {
        match self {
            NyzoStringPrefix::PrivateSeed => "key_",
            NyzoStringPrefix::PublicIdentifier => "id__",
            NyzoStringPrefix::PrefilledData => "pre_",
            NyzoStringPrefix::Micropay => "pay_",
            NyzoStringPrefix::Signature => "sig_",
            NyzoStringPrefix::Transaction => "tx__",
        }
    }

    /// The tag decoded to raw bytes, as stored in the framed buffer
    pub fn bytes(&self) -> [u8; PREFIX_LEN] {
        match self {
            NyzoStringPrefix::PrivateSeed => [0x50, 0xe8, 0x7f],
            NyzoStringPrefix::PublicIdentifier => [0x48, 0xdf, 0xff],
            NyzoStringPrefix::PrefilledData => [0x61, 0xa3, 0xbf],
            NyzoStringPrefix::Micropay => [0x60, 0xa8, 0x7f],
            NyzoStringPrefix::Signature => [0x6d, 0x24, 0x3f],
            NyzoStringPrefix::Transaction => [0x72, 0x0f, 0xff],
        }
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|prefix| prefix.bytes() == bytes)
    }
}

impl fmt::Display for NyzoStringPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checksum length for a given content length
///
/// Chosen so that `4 + content_len + checksum_length` is a multiple of 3,
/// which makes the encoded length map back to an exact byte count.
pub fn checksum_length(content_len: usize) -> usize {
    4 + (3 - (content_len + 2) % 3) % 3
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

/// Assemble `prefix || length || content || checksum`. Caller checks the length.
fn frame(prefix: NyzoStringPrefix, content: &[u8]) -> Zeroizing<Vec<u8>> {
    let checksum_len = checksum_length(content.len());
    let mut buffer = Zeroizing::new(Vec::with_capacity(
        HEADER_LEN + content.len() + checksum_len,
    ));
    buffer.extend_from_slice(&prefix.bytes());
    buffer.push(content.len() as u8);
    buffer.extend_from_slice(content);

    let checksum = double_sha256(&buffer);
    buffer.extend_from_slice(&checksum[..checksum_len]);
    buffer
}

/// Frame and encode `content` as a typed Nyzo string
pub fn encode_typed(prefix: NyzoStringPrefix, content: &[u8]) -> Result<String, NyzoStringError> {
    if content.len() > MAX_CONTENT_LEN {
        return Err(NyzoStringError::ContentTooLong {
            length: content.len(),
        });
    }
    Ok(encode(&frame(prefix, content)))
}

/// A decoded and checksum-verified typed string
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct NyzoString {
    #[zeroize(skip)]
    prefix: NyzoStringPrefix,
    content: Vec<u8>,
}

impl NyzoString {
    pub fn new(prefix: NyzoStringPrefix, content: Vec<u8>) -> Result<Self, NyzoStringError> {
        if content.len() > MAX_CONTENT_LEN {
            return Err(NyzoStringError::ContentTooLong {
                length: content.len(),
            });
        }
        Ok(Self { prefix, content })
    }

    pub fn prefix(&self) -> NyzoStringPrefix {
        self.prefix
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Move the content out, leaving this value empty
    pub fn take_content(&mut self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(std::mem::take(&mut self.content))
    }

    /// Re-encode to the string form
    pub fn encode(&self) -> String {
        encode(&frame(self.prefix, &self.content))
    }
}

// Content may be key material: never print it
impl fmt::Debug for NyzoString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NyzoString")
            .field("prefix", &self.prefix)
            .field("content_len", &self.content.len())
            .finish()
    }
}

/// Decode a typed string, verifying prefix, length and checksum
pub fn decode_typed(encoded: &str, mode: DecodeMode) -> Result<NyzoString, NyzoStringError> {
    let buffer = Zeroizing::new(decode_with(encoded, mode)?);
    if buffer.len() < HEADER_LEN {
        return Err(NyzoStringError::MalformedInput {
            length: encoded.chars().count(),
        });
    }

    let prefix = NyzoStringPrefix::from_bytes(&buffer[..PREFIX_LEN])
        .ok_or_else(|| NyzoStringError::UnknownPrefix(encoded.chars().take(4).collect()))?;

    let declared = buffer[PREFIX_LEN] as usize;
    let available = buffer.len() - HEADER_LEN;
    if available != declared + checksum_length(declared) {
        return Err(NyzoStringError::LengthMismatch {
            declared,
            available,
        });
    }

    let body_len = HEADER_LEN + declared;
    let expected = double_sha256(&buffer[..body_len]);
    if buffer[body_len..] != expected[..checksum_length(declared)] {
        return Err(NyzoStringError::ChecksumMismatch);
    }

    Ok(NyzoString {
        prefix,
        content: buffer[HEADER_LEN..body_len].to_vec(),
    })
}
