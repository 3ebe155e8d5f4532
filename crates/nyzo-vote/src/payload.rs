//! Vote transaction data
//!
//! A no/abstention vote is a 1-micronyzo transaction whose data field names
//! the signature and the vote: `base64(MD5(signature)) + " n"` or `" a"`.
//! The encoded digest is always 24 characters, so the data is 26.

use crate::vote::VoteKind;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use md5::{Digest, Md5};

/// Transaction data for voting `kind` on `signature`
///
/// `None` for yes votes, which go through cycle signing instead.
pub fn vote_data(signature: &str, kind: VoteKind) -> Option<String> {
    let code = kind.transaction_code()?;
    let digest = Md5::digest(signature.as_bytes());
    Some(format!("{} {}", STANDARD.encode(digest), code))
}
