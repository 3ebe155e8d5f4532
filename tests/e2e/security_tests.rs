//! Security-specific tests.
//!
//! These tests verify:
//! 1. Malformed Nyzo strings never panic, whatever the bytes
//! 2. Tampering with a typed string is detected
//! 3. Private keys never leak through Debug or error text
//! 4. Hostile credential and signature files are contained
//! 5. The driver never waits forever on a silent child

use nyzo_expect::{Conversation, Driver, DriverError, LineReader};
use nyzo_string::{
    decode, decode_private_key, decode_typed, decode_with, derive_private_key_string,
    encode_typed, DecodeMode, NyzoStringError, NyzoStringPrefix,
};
use nyzo_vote::payload::vote_data;
use nyzo_vote::signatures::parse_signature_list;
use nyzo_vote::verifiers::parse_managed_verifiers;
use nyzo_vote::{SignatureToken, VoteError, VoteKind};
use rand::Rng;
use std::io::Read;
use std::time::{Duration, Instant};

const SEED: &str = "0123456789abcdef-0123456789abcdef-0123456789abcdef-0123456789abcdef";

// ============================================================================
// 1. Codec robustness
// ============================================================================

#[test]
fn test_random_strings_never_panic() {
    let mut rng = rand::thread_rng();
    for _ in 0..2000 {
        let len = rng.gen_range(0..120);
        let s: String = (0..len)
            .map(|_| char::from_u32(rng.gen_range(0x20..0x3000)).unwrap_or('?'))
            .collect();
        let _ = decode(&s);
        let _ = decode_with(&s, DecodeMode::Strict);
        let _ = decode_typed(&s, DecodeMode::Lenient);
        let _ = decode_typed(&s, DecodeMode::Strict);
        let _ = derive_private_key_string(&s);
    }
}

#[test]
fn test_prefixed_garbage_never_panics() {
    let mut rng = rand::thread_rng();
    for prefix in NyzoStringPrefix::ALL {
        for len in 0..64 {
            let tail: String = (0..len)
                .map(|_| nyzo_string::alphabet::char_for(rng.gen_range(0..64)))
                .collect();
            let s = format!("{}{}", prefix, tail);
            if let Ok(parsed) = decode_typed(&s, DecodeMode::Strict) {
                // Only checksum-valid content gets through
                assert_eq!(parsed.prefix(), prefix);
            }
        }
    }
}

#[test]
fn test_oversized_declared_length_rejected() {
    // Three content bytes, but the length byte claims 255
    let valid = encode_typed(NyzoStringPrefix::PublicIdentifier, &[1, 2, 3]).unwrap();
    let mut raw = decode(&valid).unwrap();
    raw[3] = 0xff;
    let forged = nyzo_string::encode(&raw);

    assert!(matches!(
        decode_typed(&forged, DecodeMode::Strict),
        Err(NyzoStringError::LengthMismatch { declared: 255, .. })
    ));
}

// ============================================================================
// 2. Tamper detection
// ============================================================================

#[test]
fn test_every_single_character_flip_detected() {
    let content: Vec<u8> = (0..32).collect();
    let valid = encode_typed(NyzoStringPrefix::PublicIdentifier, &content).unwrap();
    let chars: Vec<char> = valid.chars().collect();

    // Skip the prefix; positions in the last character may only hold
    // padding bits, which decode ignores
    for position in 4..chars.len() - 1 {
        let mut tampered = chars.clone();
        tampered[position] = if chars[position] == 'a' { 'b' } else { 'a' };
        let tampered: String = tampered.into_iter().collect();

        match decode_typed(&tampered, DecodeMode::Strict) {
            Ok(parsed) => assert_eq!(
                parsed.content(),
                content.as_slice(),
                "flip at {} changed content without failing",
                position
            ),
            Err(_) => {}
        }
    }
}

#[test]
fn test_prefix_swap_detected() {
    let key = derive_private_key_string(SEED).unwrap();
    let swapped = format!("id__{}", &key[4..]);

    // Checksum covers the prefix bytes
    assert_eq!(
        decode_typed(&swapped, DecodeMode::Strict).unwrap_err(),
        NyzoStringError::ChecksumMismatch
    );
}

// ============================================================================
// 3. Key material hygiene
// ============================================================================

#[test]
fn test_credential_debug_hides_key() {
    let text = format!("node:9444:{}\n", SEED);
    let credentials = parse_managed_verifiers(&text).unwrap();
    let printed = format!("{:?}", credentials);

    assert!(!printed.contains(credentials[0].private_key()));
    assert!(!printed.contains("0123456789abcdef"));
}

#[test]
fn test_bad_credential_error_omits_key_text() {
    let secret_ish = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbee";
    let text = format!("node:9444:{}\n", secret_ish);

    let err = parse_managed_verifiers(&text).unwrap_err();
    assert!(matches!(err, VoteError::InvalidCredential { line: 1, .. }));
    assert!(!err.to_string().contains(secret_ish));
    assert!(!format!("{:?}", err).contains(secret_ish));
}

#[test]
fn test_typed_string_debug_hides_seed() {
    let key = derive_private_key_string(SEED).unwrap();
    let parsed = decode_typed(&key, DecodeMode::Strict).unwrap();
    let printed = format!("{:?}", parsed);

    assert!(printed.contains("content_len: 32"));
    assert!(!printed.contains("content:"));
}

#[test]
fn test_key_roundtrip_through_decode() {
    let key = derive_private_key_string(SEED).unwrap();
    let seed = decode_private_key(&key).unwrap();
    assert_eq!(hex::encode(&*seed), SEED.replace('-', ""));
}

// ============================================================================
// 4. Hostile files
// ============================================================================

#[test]
fn test_credential_file_edge_cases() {
    let text = format!(
        ":::\n\
         ::{seed}\n\
         host:9444:\n\
         host:port:{seed}:extra\n\
         {binary}\n\
         # node:9444:{seed}\n",
        seed = SEED,
        binary = "\u{0}\u{7f}\u{feff}"
    );

    // Only "::<seed>" and "host:9444:" are 3-field records; an empty key
    // field is an empty (even-length) seed
    let credentials = parse_managed_verifiers(&text).unwrap();
    assert_eq!(credentials.len(), 2);
    assert_eq!(credentials[0].label(), ":");
    assert_eq!(credentials[1].private_key(), "key_05qLDLxM");
}

#[test]
fn test_signature_list_ignores_noise() {
    let text = "\u{feff}sig_bom\n\
                sig_ok\n\
                SIG_upper\n\
                xsig_inner\n\
                \t sig_padded \t\n\
                \0\0\0\n";
    let tokens: Vec<String> = parse_signature_list(text)
        .into_iter()
        .map(|t| t.as_str().to_string())
        .collect();
    assert_eq!(tokens, vec!["sig_ok", "sig_padded"]);
}

#[test]
fn test_signature_text_never_reaches_client_input() {
    // Only the digest of a token is typed into the client
    let token = SignatureToken::parse("sig_a\nST\nkey_x").unwrap();
    let data = vote_data(token.as_str(), VoteKind::No).unwrap();
    assert!(!data.contains('\n'));
    assert!(!data.contains("ST"));
    assert_eq!(data.len(), 26);

    // Lines from files are split first, so each token is a single line
    assert!(parse_signature_list("sig_a\nST\n")
        .iter()
        .all(|t| !t.as_str().contains('\n')));
}

// ============================================================================
// 5. Bounded waits
// ============================================================================

/// A stream that never produces data
struct Silent;

impl Read for Silent {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        std::thread::sleep(Duration::from_secs(3600));
        Ok(0)
    }
}

#[test]
fn test_silent_child_times_out() {
    let reader = LineReader::spawn(Silent).unwrap();
    let driver = Driver::new(reader, Vec::new()).with_timeout(Some(Duration::from_millis(200)));
    let mut conversation = Conversation::new(driver);

    let started = Instant::now();
    let err = conversation.start("exit Nyzo client").unwrap_err();
    assert!(matches!(err, DriverError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(conversation.state().is_terminal());
}
