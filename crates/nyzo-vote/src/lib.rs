//! Nyzo Vote
//!
//! Casts a verifier operator's vote on cycle proposals by driving the
//! official Nyzo client.
//!
//! # Flow
//!
//! 1. Collect `sig_` tokens from a published proposal file, a local
//!    `vote.sig`, or the command line
//! 2. **yes**: run the cycle transaction signing script once per signature
//! 3. **no / abstention**: load the managed verifiers and, per signature,
//!    send one 1-micronyzo transaction per verifier whose data is
//!    `base64(MD5(signature))` plus the vote code
//!
//! # Example
//!
//! ```ignore
//! use nyzo_vote::{config::VoteConfig, signatures::SignatureSource, vote::{execute, VoteKind}};
//!
//! let config = VoteConfig::default();
//! let source = SignatureSource::parse("NCFP3", "vote.sig").unwrap();
//! let report = execute(&config, VoteKind::No, &source)?;
//! print!("{}", report);
//! ```

pub mod config;
pub mod payload;
pub mod signatures;
pub mod verifiers;
pub mod vote;

pub use config::VoteConfig;
pub use signatures::{SignatureSource, SignatureToken};
pub use verifiers::VerifierCredential;
pub use vote::{execute, run_vote, VoteKind, VoteReport};

use nyzo_expect::DriverError;
use nyzo_string::NyzoStringError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from a voting run
#[derive(Error, Debug)]
pub enum VoteError {
    #[error("Could not get signatures from {origin}: {reason}")]
    SourceUnavailable { origin: String, reason: String },

    #[error("No managed verifiers found in {path}")]
    NoCredentialsFound { path: PathBuf },

    #[error("Cannot read managed verifiers {path}: {source}")]
    CredentialsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid private key on managed verifiers line {line}: {source}")]
    InvalidCredential {
        line: usize,
        #[source]
        source: NyzoStringError,
    },

    #[error("Invalid signature {signature}: {source}")]
    InvalidSignature {
        signature: String,
        #[source]
        source: NyzoStringError,
    },

    #[error("Cycle transaction signing failed for {signature}: {source}")]
    CycleSigningFailed {
        signature: String,
        #[source]
        source: DriverError,
    },

    #[error("Vote on {signature} aborted after {} of {total} transaction(s): {source}", submitted.len())]
    BatchAborted {
        signature: String,
        /// Verifiers whose transaction was acknowledged before the failure
        submitted: Vec<String>,
        total: usize,
        #[source]
        source: DriverError,
    },
}

impl VoteError {
    /// Process exit code: 1 before any client ran, 2 once the client failed
    pub fn exit_code(&self) -> i32 {
        match self {
            VoteError::CycleSigningFailed { .. } | VoteError::BatchAborted { .. } => 2,
            _ => 1,
        }
    }
}
