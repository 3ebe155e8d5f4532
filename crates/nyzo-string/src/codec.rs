//! Bit-packing between byte buffers and alphabet strings
//!
//! Four characters carry exactly three bytes (24 bits), so both directions
//! walk a bit offset that advances by 2 and wraps every 3 bytes.

use crate::alphabet::{char_for, value_of};
use crate::NyzoStringError;

/// How characters outside the alphabet are treated when decoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Unknown characters decode as value 0 (tolerates copy-paste noise)
    #[default]
    Lenient,
    /// Unknown characters are an error
    Strict,
}

/// Number of characters needed to encode `byte_len` bytes
pub fn encoded_len(byte_len: usize) -> usize {
    (byte_len * 8 + 5) / 6
}

/// Number of whole bytes carried by `char_len` characters
pub fn decoded_len(char_len: usize) -> usize {
    char_len * 6 / 8
}

/// Encode a byte buffer into an alphabet string
pub fn encode(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(encoded_len(bytes.len()));

    let mut index = 0;
    let mut bit_offset: u32 = 0;
    while index < bytes.len() {
        let left = bytes[index] as u16;
        let right = bytes.get(index + 1).copied().unwrap_or(0) as u16;
        let window = (left << 8) | right;
        encoded.push(char_for(((window >> (10 - bit_offset)) & 0x3f) as u8));

        if bit_offset == 0 {
            bit_offset = 6;
        } else {
            index += 1;
            bit_offset -= 2;
        }
    }

    encoded
}

/// Decode an alphabet string leniently (unknown characters read as 0)
pub fn decode(encoded: &str) -> Result<Vec<u8>, NyzoStringError> {
    decode_with(encoded, DecodeMode::Lenient)
}

/// Decode an alphabet string into bytes
///
/// # Errors
/// - `MalformedInput` if the length is `1 mod 4`: a single trailing
///   character holds only 6 bits and no buffer encodes to it
/// - `InvalidCharacter` in strict mode for characters outside the alphabet
pub fn decode_with(encoded: &str, mode: DecodeMode) -> Result<Vec<u8>, NyzoStringError> {
    let values = encoded
        .chars()
        .enumerate()
        .map(|(position, character)| match (value_of(character), mode) {
            (Some(value), _) => Ok(value),
            (None, DecodeMode::Lenient) => Ok(0),
            (None, DecodeMode::Strict) => Err(NyzoStringError::InvalidCharacter {
                character,
                position,
            }),
        })
        .collect::<Result<Vec<u8>, _>>()?;

    if values.len() % 4 == 1 {
        return Err(NyzoStringError::MalformedInput {
            length: values.len(),
        });
    }

    let byte_len = decoded_len(values.len());
    let mut bytes = Vec::with_capacity(byte_len);
    for i in 0..byte_len {
        let index = i * 8 / 6;
        let (left, right) = match (values.get(index), values.get(index + 1)) {
            (Some(&left), Some(&right)) => (left as u16, right as u16),
            _ => {
                return Err(NyzoStringError::MalformedInput {
                    length: values.len(),
                })
            }
        };
        let bit_offset = (i * 2) % 6;
        bytes.push((((left << 6) | right) >> (4 - bit_offset)) as u8);
    }

    Ok(bytes)
}
