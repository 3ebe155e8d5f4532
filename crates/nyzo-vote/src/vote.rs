//! Vote orchestration
//!
//! - **Yes**: one cycle-signing run per signature (signature passed as an
//!   argument, no conversation beyond waiting for `fin.`)
//! - **No / abstention**: one client session per signature, sending one
//!   transaction per managed verifier
//!
//! Everything runs sequentially; each client process is dropped (and so
//! reaped) before the next signature is processed.

use crate::config::VoteConfig;
use crate::payload::vote_data;
use crate::signatures::{collect_signatures, SignatureSource, SignatureToken};
use crate::verifiers::{load_managed_verifiers, VerifierCredential};
use crate::VoteError;
use nyzo_expect::{DriverError, ProcessCommand, ScriptedProcess};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Printed by the client once it is ready for commands
pub const STARTUP_MARKER: &str = "exit Nyzo client";
/// Printed by the client after each submitted transaction
pub const TRANSACTION_MARKER: &str = "frozen edge:";
/// Printed by the client and the signing script when they are done
pub const FINAL_MARKER: &str = "fin.";

/// Client command: send transaction
pub const SEND_TRANSACTION_COMMAND: &str = "ST";
/// Client answer confirming the transaction
pub const CONFIRM_COMMAND: &str = "y";
/// Client command: exit
pub const EXIT_COMMAND: &str = "X";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Yes,
    No,
    Abstention,
}

impl VoteKind {
    /// One-letter code appended to the transaction data (`None` for yes)
    pub fn transaction_code(&self) -> Option<char> {
        match self {
            VoteKind::Yes => None,
            VoteKind::No => Some('n'),
            VoteKind::Abstention => Some('a'),
        }
    }

    pub fn needs_credentials(&self) -> bool {
        self.transaction_code().is_some()
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VoteKind::Yes => "yes",
            VoteKind::No => "no",
            VoteKind::Abstention => "abstention",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown vote kind: {0} (expected yes, no or abstention)")]
pub struct UnknownVoteKind(pub String);

impl FromStr for VoteKind {
    type Err = UnknownVoteKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" => Ok(VoteKind::Yes),
            "no" => Ok(VoteKind::No),
            "abstention" => Ok(VoteKind::Abstention),
            _ => Err(UnknownVoteKind(s.to_string())),
        }
    }
}

/// How to launch and talk to the Nyzo client
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Interactive client, used for vote transactions
    pub transaction_client: ProcessCommand,
    /// Cycle transaction signing script; the signature is appended as last argument
    pub cycle_signer: ProcessCommand,
    /// Bound on each marker wait (`None` = unbounded)
    pub marker_timeout: Option<Duration>,
    /// Time a client gets to exit after its final marker
    pub exit_grace: Duration,
    /// Vote transaction recipient (`id__` string)
    pub recipient: String,
    /// Vote transaction amount
    pub amount: String,
}

/// Outcome of voting on one signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureOutcome {
    pub signature: SignatureToken,
    pub kind: VoteKind,
    /// Labels of the verifiers whose transaction was acknowledged (empty for yes)
    pub submitted: Vec<String>,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteReport {
    pub outcomes: Vec<SignatureOutcome>,
}

impl VoteReport {
    pub fn transactions_sent(&self) -> usize {
        self.outcomes.iter().map(|o| o.submitted.len()).sum()
    }
}

impl fmt::Display for VoteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            match outcome.kind {
                VoteKind::Yes => writeln!(f, "yes on {}: cycle transaction signed", outcome.signature)?,
                kind => writeln!(
                    f,
                    "{} on {}: {} transaction(s) sent ({})",
                    kind,
                    outcome.signature,
                    outcome.submitted.len(),
                    outcome.submitted.join(", ")
                )?,
            }
        }
        Ok(())
    }
}

/// Sign the cycle transaction for `signature` (a yes vote)
pub fn sign_cycle_transaction(
    settings: &ClientSettings,
    signature: &SignatureToken,
) -> Result<(), VoteError> {
    log::info!("Signing cycle transaction for {}.", signature);

    let command = settings.cycle_signer.clone().arg(signature.as_str());
    let failed = |source: DriverError| VoteError::CycleSigningFailed {
        signature: signature.to_string(),
        source,
    };

    let mut process = ScriptedProcess::spawn(&command, settings.marker_timeout).map_err(failed)?;
    process
        .conversation()
        .finish(&[], FINAL_MARKER)
        .map_err(failed)?;
    finish_process(&mut process, settings.exit_grace);
    Ok(())
}

/// Send one vote transaction per verifier for `signature`
///
/// Returns the labels of the verifiers whose transactions were acknowledged.
///
/// # Errors
/// `BatchAborted`, listing the verifiers acknowledged before the failure.
pub fn send_vote_transactions(
    settings: &ClientSettings,
    kind: VoteKind,
    signature: &SignatureToken,
    verifiers: &[VerifierCredential],
) -> Result<Vec<String>, VoteError> {
    let Some(data) = vote_data(signature.as_str(), kind) else {
        return Ok(Vec::new());
    };

    let mut submitted = Vec::with_capacity(verifiers.len());
    let aborted = |submitted: &[String], source: DriverError| VoteError::BatchAborted {
        signature: signature.to_string(),
        submitted: submitted.to_vec(),
        total: verifiers.len(),
        source,
    };

    log::info!("Starting Nyzo client.");
    let mut process = ScriptedProcess::spawn(&settings.transaction_client, settings.marker_timeout)
        .map_err(|e| aborted(&submitted, e))?;
    let conversation = process.conversation();
    conversation
        .start(STARTUP_MARKER)
        .map_err(|e| aborted(&submitted, e))?;

    for (index, verifier) in verifiers.iter().enumerate() {
        log::info!(
            "Sending vote transaction for verifier {} ({}).",
            index + 1,
            verifier.label()
        );
        let batch = [
            SEND_TRANSACTION_COMMAND,
            verifier.private_key(),
            settings.recipient.as_str(),
            data.as_str(),
            settings.amount.as_str(),
            CONFIRM_COMMAND,
        ];
        conversation
            .exchange(&batch, TRANSACTION_MARKER)
            .map_err(|e| aborted(&submitted, e))?;
        submitted.push(verifier.label().to_string());
    }

    conversation
        .finish(&[EXIT_COMMAND], FINAL_MARKER)
        .map_err(|e| aborted(&submitted, e))?;
    finish_process(&mut process, settings.exit_grace);
    Ok(submitted)
}

/// Vote on every signature in turn
pub fn run_vote(
    settings: &ClientSettings,
    kind: VoteKind,
    signatures: &[SignatureToken],
    verifiers: &[VerifierCredential],
) -> Result<VoteReport, VoteError> {
    let mut report = VoteReport::default();

    for signature in signatures {
        log::info!("Voting {} on signature {}.", kind, signature);
        let submitted = match kind {
            VoteKind::Yes => {
                sign_cycle_transaction(settings, signature)?;
                Vec::new()
            }
            VoteKind::No | VoteKind::Abstention => {
                send_vote_transactions(settings, kind, signature, verifiers)?
            }
        };
        report.outcomes.push(SignatureOutcome {
            signature: signature.clone(),
            kind,
            submitted,
        });
    }

    Ok(report)
}

/// Collect signatures (and credentials when needed), then vote
pub fn execute(
    config: &VoteConfig,
    kind: VoteKind,
    source: &SignatureSource,
) -> Result<VoteReport, VoteError> {
    let signatures = collect_signatures(source, &config.sources)?;
    if config.codec.verify_signatures {
        for signature in &signatures {
            signature.verify(config.codec.decode_mode())?;
        }
    }

    let verifiers = if kind.needs_credentials() {
        load_managed_verifiers(&config.sources.managed_verifiers)?
    } else {
        Vec::new()
    };

    run_vote(&config.client_settings(), kind, &signatures, &verifiers)
}

/// Give the child its grace period; a straggler is killed, not an error
fn finish_process(process: &mut ScriptedProcess, grace: Duration) {
    if let Err(e) = process.wait(grace) {
        log::warn!("Nyzo client {} did not exit cleanly: {}", process.id(), e);
    }
}
