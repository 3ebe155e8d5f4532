#![no_main]

use libfuzzer_sys::fuzz_target;
use nyzo_string::{decode_private_key, decode_typed, derive_private_key_string, DecodeMode};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // A successful parse must re-encode to the same string
    if let Ok(parsed) = decode_typed(s, DecodeMode::Strict) {
        assert_eq!(parsed.encode(), s);
    }

    // Also try with the key_ prefix prepended to reach the checksum paths
    let _ = decode_private_key(&format!("key_{}", s));

    // Any even-length hex digit sequence derives a key that decodes back
    if let Ok(key) = derive_private_key_string(s) {
        decode_private_key(&key).expect("derived key decodes");
    }
});
