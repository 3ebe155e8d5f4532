//! Nyzo String Encoding
//!
//! Human-typeable text representation of binary payloads, as accepted by the
//! Nyzo verifier and client.
//!
//! # Layers
//!
//! ## Alphabet codec
//! - 64-character alphabet, 6 bits per character, MSB-first
//! - `encode(bytes)` is always `ceil(len * 8 / 6)` characters
//! - `decode(string)` is always `floor(len * 6 / 8)` bytes
//!
//! ## Typed strings
//! - `prefix || length || content || checksum`
//! - Checksum is a truncated double SHA-256 (4 to 6 bytes), sized so the
//!   whole buffer encodes without padding
//! - `key_` strings carry private seeds, `id__` strings public identifiers
//!
//! # Example: convert a dashed hex private key
//!
//! ```
//! use nyzo_string::{decode_private_key, derive_private_key_string};
//!
//! let key = derive_private_key_string("AB:CD-EF").unwrap();
//! assert_eq!(key.as_str(), "key_0YMdZZpDg.ez");
//!
//! let seed = decode_private_key(&key).unwrap();
//! assert_eq!(seed.as_slice(), &[0xab, 0xcd, 0xef]);
//! ```

pub mod alphabet;
pub mod codec;
pub mod key;
pub mod typed;

// Re-exports
pub use codec::{decode, decode_with, decoded_len, encode, encoded_len, DecodeMode};
pub use key::{decode_private_key, derive_private_key_string, normalize_hex};
pub use typed::{checksum_length, decode_typed, encode_typed, NyzoString, NyzoStringPrefix};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NyzoStringError {
    #[error("Malformed input: {length} characters cannot encode a whole number of bytes")]
    MalformedInput { length: usize },
    #[error("Invalid character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("Invalid hex length: {digits} digits (must be even)")]
    InvalidHexLength { digits: usize },
    #[error("Content too long: {length} bytes (max 255)")]
    ContentTooLong { length: usize },
    #[error("Unknown prefix: {0}")]
    UnknownPrefix(String),
    #[error("Expected a {expected} string, found {found}")]
    PrefixMismatch { expected: String, found: String },
    #[error("Length mismatch: declared {declared} content bytes, buffer holds {available}")]
    LengthMismatch { declared: usize, available: usize },
    #[error("Checksum mismatch")]
    ChecksumMismatch,
}
