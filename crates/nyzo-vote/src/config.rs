//! Vote configuration: parsed from TOML file + environment variable overrides.
//!
//! Priority: environment variables > config file > defaults. Every field has
//! a default matching a stock verifier install, so the file is optional.

use crate::vote::ClientSettings;
use anyhow::{Context, Result};
use nyzo_expect::ProcessCommand;
use nyzo_string::{decode_typed, DecodeMode, NyzoStringPrefix};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteConfig {
    /// How the Nyzo client is launched
    #[serde(default)]
    pub client: ClientSection,

    /// Where signatures and credentials come from
    #[serde(default)]
    pub sources: SourcesSection,

    /// Vote transaction parameters
    #[serde(default)]
    pub vote: VoteSection,

    /// Nyzo string handling
    #[serde(default)]
    pub codec: CodecSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// Nyzo client launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSection {
    /// Java executable
    #[serde(default = "default_java")]
    pub java: PathBuf,

    /// Verifier jar containing the client and scripts
    #[serde(default = "default_jar")]
    pub jar: PathBuf,

    /// Main class of the interactive client
    #[serde(default = "default_client_class")]
    pub client_class: String,

    /// Main class of the cycle transaction signing script
    #[serde(default = "default_cycle_sign_class")]
    pub cycle_sign_class: String,

    /// Max seconds to wait for any expected client output (0 = no limit)
    #[serde(default = "default_marker_timeout")]
    pub marker_timeout_secs: u64,

    /// Seconds the client gets to exit after its last output
    #[serde(default = "default_exit_grace")]
    pub exit_grace_secs: u64,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            java: default_java(),
            jar: default_jar(),
            client_class: default_client_class(),
            cycle_sign_class: default_cycle_sign_class(),
            marker_timeout_secs: default_marker_timeout(),
            exit_grace_secs: default_exit_grace(),
        }
    }
}

/// Signature and credential sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesSection {
    /// Base URL of the published `<NCFP>.sig` files
    #[serde(default = "default_signature_base_url")]
    pub signature_base_url: String,

    /// Local signature file name, also the CLI keyword selecting it
    #[serde(default = "default_local_signature_file")]
    pub local_signature_file: String,

    /// Verifier's managed verifiers file (`host:port:private-key-hex`)
    #[serde(default = "default_managed_verifiers")]
    pub managed_verifiers: PathBuf,

    /// Timeout for the remote signature fetch, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for SourcesSection {
    fn default() -> Self {
        Self {
            signature_base_url: default_signature_base_url(),
            local_signature_file: default_local_signature_file(),
            managed_verifiers: default_managed_verifiers(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

/// No/abstention transaction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteSection {
    /// Recipient of vote transactions (`id__` string)
    #[serde(default = "default_recipient")]
    pub recipient: String,

    /// Transaction amount in nyzos
    #[serde(default = "default_amount")]
    pub amount: String,
}

impl Default for VoteSection {
    fn default() -> Self {
        Self {
            recipient: default_recipient(),
            amount: default_amount(),
        }
    }
}

/// Nyzo string handling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodecSection {
    /// Reject characters outside the alphabet instead of reading them as 0
    #[serde(default)]
    pub strict: bool,

    /// Checksum-verify every `sig_` token before voting
    #[serde(default)]
    pub verify_signatures: bool,
}

impl CodecSection {
    pub fn decode_mode(&self) -> DecodeMode {
        if self.strict {
            DecodeMode::Strict
        } else {
            DecodeMode::Lenient
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_java() -> PathBuf {
    PathBuf::from("java")
}

fn default_jar() -> PathBuf {
    PathBuf::from("/home/ubuntu/nyzoVerifier/build/libs/nyzoVerifier-1.0.jar")
}

fn default_client_class() -> String {
    "co.nyzo.verifier.client.Client".to_string()
}

fn default_cycle_sign_class() -> String {
    "co.nyzo.verifier.scripts.CycleTransactionSignScript".to_string()
}

fn default_marker_timeout() -> u64 {
    300
}

fn default_exit_grace() -> u64 {
    10
}

fn default_signature_base_url() -> String {
    "https://raw.githubusercontent.com/cryptic-monk/nyzo-voting/master/sig/".to_string()
}

fn default_local_signature_file() -> String {
    "vote.sig".to_string()
}

fn default_managed_verifiers() -> PathBuf {
    PathBuf::from("/var/lib/nyzo/production/managed_verifiers")
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_recipient() -> String {
    // Vote sink: receives 1 micronyzo per vote
    "id__8bo.fFTWDC1m2hX6UWxw6Vgs2IsWTCJyIFAcm3V.BytZgoahsDN5".to_string()
}

fn default_amount() -> String {
    "0.000001".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl VoteConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: VoteConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `NYZO_VOTE_JAVA`
    /// - `NYZO_VOTE_JAR`
    /// - `NYZO_VOTE_TIMEOUT`
    /// - `NYZO_VOTE_SIGNATURE_URL`
    /// - `NYZO_VOTE_MANAGED_VERIFIERS`
    /// - `NYZO_VOTE_RECIPIENT`
    /// - `NYZO_VOTE_LOG_LEVEL`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("NYZO_VOTE_JAVA") {
            self.client.java = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("NYZO_VOTE_JAR") {
            self.client.jar = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("NYZO_VOTE_TIMEOUT") {
            if let Ok(secs) = v.parse::<u64>() {
                self.client.marker_timeout_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("NYZO_VOTE_SIGNATURE_URL") {
            self.sources.signature_base_url = v;
        }
        if let Ok(v) = std::env::var("NYZO_VOTE_MANAGED_VERIFIERS") {
            self.sources.managed_verifiers = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("NYZO_VOTE_RECIPIENT") {
            self.vote.recipient = v;
        }
        if let Ok(v) = std::env::var("NYZO_VOTE_LOG_LEVEL") {
            self.logging.log_level = v;
        }
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.client.jar.as_os_str().is_empty(),
            "client.jar must not be empty"
        );

        let recipient = decode_typed(&self.vote.recipient, self.codec.decode_mode())
            .with_context(|| format!("vote.recipient is not a valid Nyzo string: {}", self.vote.recipient))?;
        anyhow::ensure!(
            recipient.prefix() == NyzoStringPrefix::PublicIdentifier,
            "vote.recipient must be an {} string, found {}",
            NyzoStringPrefix::PublicIdentifier,
            recipient.prefix()
        );

        let amount: f64 = self
            .vote
            .amount
            .parse()
            .with_context(|| format!("vote.amount is not a number: {}", self.vote.amount))?;
        anyhow::ensure!(amount > 0.0, "vote.amount must be > 0");

        anyhow::ensure!(
            self.sources.signature_base_url.ends_with('/'),
            "sources.signature_base_url must end with '/'"
        );
        anyhow::ensure!(
            !self.sources.local_signature_file.is_empty(),
            "sources.local_signature_file must not be empty"
        );

        Ok(())
    }

    /// Marker timeout, `None` when disabled
    pub fn marker_timeout(&self) -> Option<Duration> {
        match self.client.marker_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Launch parameters for both client conversations
    pub fn client_settings(&self) -> ClientSettings {
        let jar = self.client.jar.display().to_string();
        ClientSettings {
            transaction_client: ProcessCommand::new(&self.client.java).args([
                "-jar".to_string(),
                jar.clone(),
                self.client.client_class.clone(),
            ]),
            cycle_signer: ProcessCommand::new(&self.client.java).args([
                "-jar".to_string(),
                jar,
                self.client.cycle_sign_class.clone(),
            ]),
            marker_timeout: self.marker_timeout(),
            exit_grace: Duration::from_secs(self.client.exit_grace_secs),
            recipient: self.vote.recipient.clone(),
            amount: self.vote.amount.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn full_toml() -> &'static str {
        r#"
[client]
java = "/usr/lib/jvm/bin/java"
jar = "/opt/nyzo/nyzoVerifier-1.0.jar"
marker_timeout_secs = 60
exit_grace_secs = 3

[sources]
signature_base_url = "https://example.com/sig/"
local_signature_file = "ballot.sig"
managed_verifiers = "/tmp/managed_verifiers"
fetch_timeout_secs = 5

[vote]
amount = "0.000002"

[codec]
strict = true
verify_signatures = true

[logging]
log_level = "debug"
"#
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let config = VoteConfig::from_file_or_default(Path::new("/nonexistent/nyzo-vote.toml"))
            .unwrap();
        assert_eq!(config.client.java, PathBuf::from("java"));
        assert_eq!(
            config.sources.managed_verifiers,
            PathBuf::from("/var/lib/nyzo/production/managed_verifiers")
        );
        assert_eq!(config.sources.local_signature_file, "vote.sig");
        assert_eq!(config.vote.amount, "0.000001");
        assert_eq!(config.codec.decode_mode(), DecodeMode::Lenient);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_empty_file_uses_defaults() {
        let file = write_config("");
        let config = VoteConfig::from_file(file.path()).unwrap();
        assert_eq!(config.client.marker_timeout_secs, 300);
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_parse_full_config() {
        let file = write_config(full_toml());
        let config = VoteConfig::from_file(file.path()).unwrap();

        assert_eq!(config.client.java, PathBuf::from("/usr/lib/jvm/bin/java"));
        assert_eq!(config.marker_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.sources.local_signature_file, "ballot.sig");
        assert_eq!(config.vote.amount, "0.000002");
        // Not set in the file: default recipient
        assert!(config.vote.recipient.starts_with("id__"));
        assert_eq!(config.codec.decode_mode(), DecodeMode::Strict);
        assert!(config.codec.verify_signatures);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_settings_commands() {
        let file = write_config(full_toml());
        let settings = VoteConfig::from_file(file.path()).unwrap().client_settings();

        assert_eq!(
            settings.transaction_client.to_string(),
            "/usr/lib/jvm/bin/java -jar /opt/nyzo/nyzoVerifier-1.0.jar co.nyzo.verifier.client.Client"
        );
        assert_eq!(
            settings.cycle_signer.args.last().map(String::as_str),
            Some("co.nyzo.verifier.scripts.CycleTransactionSignScript")
        );
        assert_eq!(settings.exit_grace, Duration::from_secs(3));
    }

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let file = write_config("[client]\nmarker_timeout_secs = 0\n");
        let config = VoteConfig::from_file(file.path()).unwrap();
        assert_eq!(config.marker_timeout(), None);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = VoteConfig::default();

        std::env::set_var("NYZO_VOTE_JAR", "/env/nyzo.jar");
        std::env::set_var("NYZO_VOTE_TIMEOUT", "45");
        std::env::set_var("NYZO_VOTE_MANAGED_VERIFIERS", "/env/managed_verifiers");

        config.apply_env_overrides();

        assert_eq!(config.client.jar, PathBuf::from("/env/nyzo.jar"));
        assert_eq!(config.client.marker_timeout_secs, 45);
        assert_eq!(
            config.sources.managed_verifiers,
            PathBuf::from("/env/managed_verifiers")
        );

        // Clean up
        std::env::remove_var("NYZO_VOTE_JAR");
        std::env::remove_var("NYZO_VOTE_TIMEOUT");
        std::env::remove_var("NYZO_VOTE_MANAGED_VERIFIERS");
    }

    #[test]
    fn test_validation_bad_recipient_checksum() {
        let mut config = VoteConfig::default();
        config.vote.recipient = config.vote.recipient.replace("8bo", "8bp");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_recipient_must_be_identifier() {
        let mut config = VoteConfig::default();
        config.vote.recipient =
            nyzo_string::encode_typed(NyzoStringPrefix::PrivateSeed, &[1u8; 32]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("id__"));
    }

    #[test]
    fn test_strict_recipient_rejects_noise() {
        let mut config = VoteConfig::default();
        config.vote.recipient.push(' ');
        config.codec.strict = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_amount() {
        let mut config = VoteConfig::default();
        config.vote.amount = "zero".into();
        assert!(config.validate().is_err());
        config.vote.amount = "0".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_base_url_slash() {
        let mut config = VoteConfig::default();
        config.sources.signature_base_url = "https://example.com/sig".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let file = write_config(full_toml());
        let config = VoteConfig::from_file(file.path()).unwrap();
        let serialized = toml::to_string_pretty(&config).unwrap();

        let reparsed: VoteConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(reparsed.client.jar, config.client.jar);
        assert_eq!(reparsed.vote.amount, config.vote.amount);
    }
}
