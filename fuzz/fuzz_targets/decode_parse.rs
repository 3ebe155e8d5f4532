#![no_main]

use libfuzzer_sys::fuzz_target;
use nyzo_string::{decode_with, decoded_len, encode, DecodeMode};

fuzz_target!(|data: &[u8]| {
    // Arbitrary text must decode to Ok or Err, never panic
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = decode_with(s, DecodeMode::Lenient);
        if let Ok(bytes) = decode_with(s, DecodeMode::Strict) {
            assert_eq!(bytes.len(), decoded_len(s.chars().count()));
        }
    }

    // Arbitrary bytes always survive encode → decode
    let encoded = encode(data);
    let decoded = decode_with(&encoded, DecodeMode::Strict).expect("encoder output decodes");
    assert_eq!(&decoded[..data.len()], data);
});
