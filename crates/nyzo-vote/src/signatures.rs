//! Signature collection
//!
//! A vote targets one or more `sig_` tokens, taken from one of three
//! sources: the published `<NCFP>.sig` file, a local signature file, or a
//! single token given directly.

use crate::config::SourcesSection;
use crate::VoteError;
use nyzo_string::{decode_typed, DecodeMode, NyzoStringPrefix};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Prefix of every signature token
pub const SIGNATURE_PREFIX: &str = "sig_";

/// Tag selecting a published proposal file (`NCFP3`, `ncfp-10`, ...)
pub const PROPOSAL_TAG: &str = "NCFP";

/// An opaque signature identifier to vote on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureToken(String);

impl SignatureToken {
    /// Accept a trimmed `sig_` token
    pub fn parse(input: &str) -> Option<Self> {
        let token = input.trim();
        token
            .starts_with(SIGNATURE_PREFIX)
            .then(|| Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checksum-verify the token as a typed Nyzo string
    pub fn verify(&self, mode: DecodeMode) -> Result<(), VoteError> {
        let parsed = decode_typed(&self.0, mode).map_err(|source| VoteError::InvalidSignature {
            signature: self.0.clone(),
            source,
        })?;
        if parsed.prefix() != NyzoStringPrefix::Signature {
            return Err(VoteError::InvalidSignature {
                signature: self.0.clone(),
                source: nyzo_string::NyzoStringError::PrefixMismatch {
                    expected: NyzoStringPrefix::Signature.to_string(),
                    found: parsed.prefix().to_string(),
                },
            });
        }
        Ok(())
    }
}

impl fmt::Display for SignatureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the signatures come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureSource {
    /// Published proposal file, by upper-cased proposal name
    Remote { proposal: String },
    /// Local signature file
    LocalFile(PathBuf),
    /// A single token from the command line
    Direct(SignatureToken),
}

impl SignatureSource {
    /// Classify a command-line source argument
    ///
    /// `local_file_name` is matched case-insensitively. Returns `None` for
    /// anything that is not a proposal tag, the local file, or a `sig_` token.
    /// A proposal name may only hold `A-Z`, `0-9` and `-` after the tag.
    pub fn parse(input: &str, local_file_name: &str) -> Option<Self> {
        let input = input.trim();
        let upper = input.to_uppercase();
        if let Some(name) = upper.strip_prefix(PROPOSAL_TAG) {
            if !name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
            {
                return None;
            }
            return Some(SignatureSource::Remote { proposal: upper });
        }
        if input.eq_ignore_ascii_case(local_file_name) {
            return Some(SignatureSource::LocalFile(PathBuf::from(local_file_name)));
        }
        SignatureToken::parse(input).map(SignatureSource::Direct)
    }
}

impl fmt::Display for SignatureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureSource::Remote { proposal } => write!(f, "proposal {}", proposal),
            SignatureSource::LocalFile(path) => write!(f, "{}", path.display()),
            SignatureSource::Direct(token) => write!(f, "{}", token),
        }
    }
}

/// Keep the non-empty lines that are `sig_` tokens
pub fn parse_signature_list(text: &str) -> Vec<SignatureToken> {
    text.lines().filter_map(SignatureToken::parse).collect()
}

/// URL of a published proposal's signature file
pub fn remote_url(base_url: &str, proposal: &str) -> String {
    format!("{}{}.sig", base_url, proposal)
}

/// Resolve a source into its signatures
///
/// # Errors
/// `SourceUnavailable` if the file cannot be fetched or read, or holds no
/// signatures.
pub fn collect_signatures(
    source: &SignatureSource,
    sources: &SourcesSection,
) -> Result<Vec<SignatureToken>, VoteError> {
    let signatures = match source {
        SignatureSource::Remote { proposal } => {
            let url = remote_url(&sources.signature_base_url, proposal);
            log::info!("Retrieving signatures from: {}", url);
            let text = fetch_remote(&url, Duration::from_secs(sources.fetch_timeout_secs))
                .map_err(|e| VoteError::SourceUnavailable {
                    origin: url.clone(),
                    reason: e.to_string(),
                })?;
            parse_signature_list(&text)
        }
        SignatureSource::LocalFile(path) => {
            log::info!("Retrieving signatures from {}", path.display());
            let text =
                std::fs::read_to_string(path).map_err(|e| VoteError::SourceUnavailable {
                    origin: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            parse_signature_list(&text)
        }
        SignatureSource::Direct(token) => vec![token.clone()],
    };

    if signatures.is_empty() {
        return Err(VoteError::SourceUnavailable {
            origin: source.to_string(),
            reason: "no signatures found".into(),
        });
    }

    log::info!("Found {} signature(s) to vote on.", signatures.len());
    Ok(signatures)
}

fn fetch_remote(url: &str, timeout: Duration) -> Result<String, reqwest::Error> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;
    client.get(url).send()?.error_for_status()?.text()
}
