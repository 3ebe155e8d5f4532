//! Managed verifier credentials
//!
//! The verifier's `managed_verifiers` file holds one `host:port:key` record
//! per line, the key being a (usually dashed) hex private seed. `#` starts a
//! comment. Lines that are not 3-field records are skipped.

use crate::VoteError;
use nyzo_string::derive_private_key_string;
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

/// A managed verifier's `key_` string and a printable label
#[derive(Clone)]
pub struct VerifierCredential {
    label: String,
    key: Zeroizing<String>,
}

impl VerifierCredential {
    pub fn new(label: impl Into<String>, key: Zeroizing<String>) -> Self {
        Self {
            label: label.into(),
            key,
        }
    }

    /// `host:port` of the verifier
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The `key_` string sent to the client as transaction sender
    pub fn private_key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for VerifierCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierCredential")
            .field("label", &self.label)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Parse the contents of a managed verifiers file
///
/// # Errors
/// `InvalidCredential` (with the 1-based line number) if a record's key
/// field does not derive to a private key string.
pub fn parse_managed_verifiers(text: &str) -> Result<Vec<VerifierCredential>, VoteError> {
    let mut credentials = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = match raw.find('#') {
            Some(comment) => &raw[..comment],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 3 {
            log::debug!("Skipping line {}: not a host:port:key record", index + 1);
            continue;
        }

        let key = derive_private_key_string(fields[2]).map_err(|source| {
            VoteError::InvalidCredential {
                line: index + 1,
                source,
            }
        })?;
        credentials.push(VerifierCredential::new(
            format!("{}:{}", fields[0].trim(), fields[1].trim()),
            key,
        ));
    }

    Ok(credentials)
}

/// Load managed verifiers, requiring at least one
pub fn load_managed_verifiers(path: &Path) -> Result<Vec<VerifierCredential>, VoteError> {
    log::info!("Loading managed verifiers from {}", path.display());

    let text = Zeroizing::new(std::fs::read_to_string(path).map_err(|source| {
        VoteError::CredentialsUnreadable {
            path: path.to_path_buf(),
            source,
        }
    })?);

    let credentials = parse_managed_verifiers(&text)?;
    if credentials.is_empty() {
        return Err(VoteError::NoCredentialsFound {
            path: path.to_path_buf(),
        });
    }

    log::info!("Found {} verifier(s).", credentials.len());
    Ok(credentials)
}
