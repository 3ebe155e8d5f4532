//! The 64-character Nyzo alphabet
//!
//! Digits, lowercase without `l`, uppercase without `O`, then `-.~_`.
//! The ordering is load-bearing: every existing Nyzo string depends on it.

/// Alphabet characters, indexed by their 6-bit value
pub const ALPHABET: &[u8; 64] =
    b"0123456789abcdefghijkmnopqrstuvwxyzABCDEFGHIJKLMNPQRSTUVWXYZ-.~_";

/// Marker for "not in the alphabet" in [`VALUE_LOOKUP`]
const INVALID: u8 = 0xff;

/// Reverse lookup table for ASCII characters
const VALUE_LOOKUP: [u8; 128] = build_lookup();

const fn build_lookup() -> [u8; 128] {
    let mut table = [INVALID; 128];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Character for a 6-bit value (only the low 6 bits are used)
pub fn char_for(value: u8) -> char {
    ALPHABET[(value & 0x3f) as usize] as char
}

/// 6-bit value of a character, or `None` if it is not in the alphabet
pub fn value_of(c: char) -> Option<u8> {
    if !c.is_ascii() {
        return None;
    }
    match VALUE_LOOKUP[c as usize] {
        INVALID => None,
        value => Some(value),
    }
}
