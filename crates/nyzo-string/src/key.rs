//! Private key strings
//!
//! Converts the verifier's raw hex private seed (as stored in
//! `managed_verifiers`, often dash-separated) into the `key_` string form
//! accepted by the Nyzo client.

use crate::codec::DecodeMode;
use crate::typed::{decode_typed, encode_typed, NyzoStringPrefix};
use crate::NyzoStringError;
use zeroize::Zeroizing;

/// Lowercase and drop every character that is not a hex digit
pub fn normalize_hex(input: &str) -> Zeroizing<String> {
    Zeroizing::new(
        input
            .chars()
            .map(|c| c.to_ascii_lowercase())
            .filter(|c| matches!(c, '0'..='9' | 'a'..='f'))
            .collect(),
    )
}

/// Derive the `key_` string for a hex private seed
///
/// Separator noise (dashes, colons, whitespace, anything non-hex) is ignored.
///
/// # Errors
/// - `InvalidHexLength` if an odd number of hex digits remains
/// - `ContentTooLong` for seeds over 255 bytes
pub fn derive_private_key_string(hex_input: &str) -> Result<Zeroizing<String>, NyzoStringError> {
    let digits = normalize_hex(hex_input);
    if digits.len() % 2 != 0 {
        return Err(NyzoStringError::InvalidHexLength {
            digits: digits.len(),
        });
    }

    let content = Zeroizing::new(hex::decode(digits.as_bytes()).map_err(|_| {
        NyzoStringError::InvalidHexLength {
            digits: digits.len(),
        }
    })?);

    encode_typed(NyzoStringPrefix::PrivateSeed, &content).map(Zeroizing::new)
}

/// Decode a `key_` string back to the raw seed, verifying its checksum
pub fn decode_private_key(encoded: &str) -> Result<Zeroizing<Vec<u8>>, NyzoStringError> {
    let mut parsed = decode_typed(encoded, DecodeMode::Strict)?;
    if parsed.prefix() != NyzoStringPrefix::PrivateSeed {
        return Err(NyzoStringError::PrefixMismatch {
            expected: NyzoStringPrefix::PrivateSeed.to_string(),
            found: parsed.prefix().to_string(),
        });
    }
    Ok(parsed.take_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DASHED_SEED: &str =
        "0123456789abcdef-0123456789abcdef-0123456789abcdef-0123456789abcdef";

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            derive_private_key_string("abcdef").unwrap().as_str(),
            "key_0YMdZZpDg.ez"
        );
        assert_eq!(derive_private_key_string("").unwrap().as_str(), "key_05qLDLxM");
        assert_eq!(
            derive_private_key_string(&"00".repeat(32)).unwrap().as_str(),
            "key_80000000000000000000000000000000000000000000Dr8LKp4w"
        );
        assert_eq!(
            derive_private_key_string(DASHED_SEED).unwrap().as_str(),
            "key_804Ahnv9H-VM0id5qWDIRv-18SmEzrMdZN4Ahnv9H-VMAIRJInZH"
        );
    }

    #[test]
    fn test_separators_and_case_ignored() {
        let plain = derive_private_key_string("abcdef").unwrap();
        assert_eq!(derive_private_key_string("AB:CD-EF").unwrap(), plain);
        assert_eq!(derive_private_key_string(" ab cd\tef\n").unwrap(), plain);
        // Non-hex letters are dropped, not rejected
        assert_eq!(derive_private_key_string("xyz-ab-cd-ef-ghi").unwrap(), plain);
    }

    #[test]
    fn test_deterministic() {
        let first = derive_private_key_string(DASHED_SEED).unwrap();
        let second = derive_private_key_string(DASHED_SEED).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_odd_length_rejected() {
        assert_eq!(
            derive_private_key_string("abc").unwrap_err(),
            NyzoStringError::InvalidHexLength { digits: 3 }
        );
        // Odd after noise is stripped
        assert_eq!(
            derive_private_key_string("ab-c").unwrap_err(),
            NyzoStringError::InvalidHexLength { digits: 3 }
        );
    }

    #[test]
    fn test_private_key_round_trip() {
        let key = derive_private_key_string(DASHED_SEED).unwrap();
        let seed = decode_private_key(&key).unwrap();
        assert_eq!(seed.len(), 32);
        assert_eq!(hex::encode(seed.as_slice()), normalize_hex(DASHED_SEED).as_str());
    }

    #[test]
    fn test_decode_private_key_rejects_identifiers() {
        let id = encode_typed(NyzoStringPrefix::PublicIdentifier, &[7u8; 32]).unwrap();
        assert_eq!(
            decode_private_key(&id).unwrap_err(),
            NyzoStringError::PrefixMismatch {
                expected: "key_".into(),
                found: "id__".into()
            }
        );
    }
}
