//! nyzo-vote: cast cycle votes for the managed verifiers of this host
//!
//! # Usage
//!
//! ```bash
//! nyzo-vote no NCFP3                  # vote no on a published proposal
//! nyzo-vote abstention vote.sig       # abstain on the signatures in ./vote.sig
//! nyzo-vote yes sig_g0010xc41gp7...   # sign one cycle transaction
//! nyzo-vote --config vote.toml --validate
//! ```

use anyhow::{Context, Result};
use nyzo_vote::{execute, SignatureSource, VoteConfig, VoteKind};
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_CONFIG: &str = "nyzo-vote.toml";

/// Exit code for bad command lines (EX_USAGE)
const USAGE_EXIT: u8 = 64;

struct Cli {
    config_path: PathBuf,
    explicit_config: bool,
    validate_only: bool,
    positional: Vec<String>,
}

enum Parsed {
    Run(Cli),
    Done,
}

fn main() -> ExitCode {
    // Parse CLI args (minimal, no clap)
    let cli = match parse_args(std::env::args().skip(1)) {
        Ok(Parsed::Run(cli)) => cli,
        Ok(Parsed::Done) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!("Run `nyzo-vote --help` for usage.");
            return ExitCode::from(USAGE_EXIT);
        }
    };

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(1);
        }
    };

    // Init logger
    std::env::set_var("RUST_LOG", &config.logging.log_level);
    env_logger::init();

    if cli.validate_only {
        print_summary(&config);
        return ExitCode::SUCCESS;
    }

    let (kind, source) = match vote_arguments(&cli.positional, &config) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::from(USAGE_EXIT);
        }
    };

    log::info!("Voting {} using signatures from {}.", kind, source);
    match execute(&config, kind, &source) {
        Ok(report) => {
            print!("{}", report);
            log::info!("Done.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Parsed, String> {
    let mut cli = Cli {
        config_path: PathBuf::from(DEFAULT_CONFIG),
        explicit_config: false,
        validate_only: false,
        positional: Vec::new(),
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| "--config requires a path argument".to_string())?;
                cli.config_path = PathBuf::from(path);
                cli.explicit_config = true;
            }
            "--validate" => {
                cli.validate_only = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(Parsed::Done);
            }
            "--version" | "-V" => {
                println!("nyzo-vote {}", env!("CARGO_PKG_VERSION"));
                return Ok(Parsed::Done);
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown argument: {}", other));
            }
            _ => cli.positional.push(arg),
        }
    }

    if !cli.validate_only && cli.positional.len() != 2 {
        return Err("expected a vote kind and a signature source".into());
    }
    Ok(Parsed::Run(cli))
}

fn load_config(cli: &Cli) -> Result<VoteConfig> {
    let mut config = if cli.explicit_config {
        VoteConfig::from_file(&cli.config_path)
    } else {
        VoteConfig::from_file_or_default(&cli.config_path)
    }
    .with_context(|| format!("Failed to load config from {}", cli.config_path.display()))?;

    config.apply_env_overrides();
    config
        .validate()
        .context("Configuration validation failed")?;
    Ok(config)
}

fn vote_arguments(positional: &[String], config: &VoteConfig) -> Result<(VoteKind, SignatureSource), String> {
    let [kind, source] = positional else {
        return Err("expected a vote kind and a signature source".into());
    };

    let kind: VoteKind = kind.parse().map_err(|e| format!("{}", e))?;
    let source = SignatureSource::parse(source, &config.sources.local_signature_file)
        .ok_or_else(|| {
            format!(
                "Unknown signature source: {} (expected NCFPn, {} or a sig_ string)",
                source, config.sources.local_signature_file
            )
        })?;
    Ok((kind, source))
}

fn print_summary(config: &VoteConfig) {
    println!("Configuration is valid.");
    println!("  Java:              {}", config.client.java.display());
    println!("  Verifier jar:      {}", config.client.jar.display());
    match config.marker_timeout() {
        Some(timeout) => println!("  Marker timeout:    {} secs", timeout.as_secs()),
        None => println!("  Marker timeout:    none"),
    }
    println!("  Signature URL:     {}", config.sources.signature_base_url);
    println!("  Local signatures:  {}", config.sources.local_signature_file);
    println!(
        "  Managed verifiers: {}",
        config.sources.managed_verifiers.display()
    );
    println!("  Recipient:         {}", config.vote.recipient);
    println!("  Amount:            {}", config.vote.amount);
    println!("  Decode mode:       {:?}", config.codec.decode_mode());
}

fn print_help() {
    println!(
        r#"nyzo-vote: cast Nyzo cycle votes through the Nyzo client

USAGE:
    nyzo-vote [OPTIONS] <yes|no|abstention> <SOURCE>

SOURCE:
    NCFPn                 Fetch the published signature file of proposal NCFPn
    vote.sig              Read signatures from the local signature file
    sig_...               Vote on a single signature

OPTIONS:
    -c, --config <PATH>   Config file path (default: ./nyzo-vote.toml, optional)
    --validate            Validate configuration and exit
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES (override config file):
    NYZO_VOTE_JAVA               Java executable
    NYZO_VOTE_JAR                Verifier jar path
    NYZO_VOTE_TIMEOUT            Marker timeout in seconds (0 = none)
    NYZO_VOTE_SIGNATURE_URL      Base URL of published signature files
    NYZO_VOTE_MANAGED_VERIFIERS  Managed verifiers file
    NYZO_VOTE_RECIPIENT          Vote transaction recipient (id__ string)
    NYZO_VOTE_LOG_LEVEL          Log level (error/warn/info/debug/trace)

EXIT CODES:
    0    success
    1    signature source, credential or configuration failure
    2    Nyzo client failure
    64   usage error
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run(list: &[&str]) -> Cli {
        match parse_args(args(list)) {
            Ok(Parsed::Run(cli)) => cli,
            Ok(Parsed::Done) => panic!("unexpected early exit"),
            Err(e) => panic!("unexpected usage error: {}", e),
        }
    }

    #[test]
    fn test_parse_vote() {
        let cli = run(&["no", "NCFP3"]);
        assert_eq!(cli.positional, vec!["no", "NCFP3"]);
        assert_eq!(cli.config_path, PathBuf::from(DEFAULT_CONFIG));
        assert!(!cli.explicit_config);
    }

    #[test]
    fn test_parse_config_flag() {
        let cli = run(&["-c", "/etc/vote.toml", "yes", "vote.sig"]);
        assert_eq!(cli.config_path, PathBuf::from("/etc/vote.toml"));
        assert!(cli.explicit_config);

        assert!(parse_args(args(&["--config"])).is_err());
    }

    #[test]
    fn test_validate_needs_no_positionals() {
        assert!(run(&["--validate"]).validate_only);
    }

    #[test]
    fn test_usage_errors() {
        assert!(parse_args(args(&["no"])).is_err());
        assert!(parse_args(args(&["no", "NCFP3", "extra"])).is_err());
        assert!(parse_args(args(&["--bogus", "no", "NCFP3"])).is_err());
    }

    #[test]
    fn test_vote_arguments() {
        let config = VoteConfig::default();

        let (kind, source) = vote_arguments(&args(&["Abstention", "ncfp7"]), &config).unwrap();
        assert_eq!(kind, VoteKind::Abstention);
        assert_eq!(
            source,
            SignatureSource::Remote {
                proposal: "NCFP7".into()
            }
        );

        assert!(vote_arguments(&args(&["maybe", "NCFP3"]), &config).is_err());
        assert!(vote_arguments(&args(&["no", "ballot.txt"]), &config).is_err());
    }
}
