//! CLI module for the packaging verification harness
//!
//! ## Commands
//!
//! - `run` - Run the verification checks (pytest-style)
//! - `list` - List the checks and their markers
//! - `schema` - Print the backend settings schema as JSON
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//! - `runner` - Check selection, execution, and reporting
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod runner;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::checks::Marker;
use crate::config::{DEFAULT_PROJECT_DIR, DEFAULT_PYTHON, Expectations, HarnessConfig, SdistHashes};
use crate::interpreter::PythonVersion;
use crate::settings::ConfigSetting;
use crate::version::HARNESS_VERSION;

use runner::Selection;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Verify that a PEP 517/518 backend builds, packages, and installs a sample project
#[derive(Parser, Debug)]
#[command(name = "pep518-check")]
#[command(version = HARNESS_VERSION)]
#[command(about = "PEP 517/518 packaging verification harness", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Host interpreter used for building and environment creation
    #[arg(long, global = true, env = "PEP518_CHECK_PYTHON", default_value = DEFAULT_PYTHON)]
    pub python: PathBuf,

    /// Sample project directory
    #[arg(long, global = true, env = "PEP518_CHECK_PROJECT", default_value = DEFAULT_PROJECT_DIR)]
    pub project: PathBuf,

    /// Local wheel directory for pip inside ephemeral environments
    #[arg(long = "find-links", global = true, env = "PEP518_CHECK_FIND_LINKS", value_name = "DIR")]
    pub find_links: Option<PathBuf>,

    /// Expected sdist SHA-256 for interpreters at or above the hash threshold
    #[arg(long = "sdist-hash", global = true, env = "PEP518_CHECK_SDIST_HASH", value_name = "SHA256", value_parser = parse_digest)]
    pub sdist_hash: Option<String>,

    /// Expected sdist SHA-256 for interpreters below the hash threshold
    #[arg(
        long = "sdist-hash-before-threshold",
        global = true,
        env = "PEP518_CHECK_SDIST_HASH_BEFORE_THRESHOLD",
        value_name = "SHA256",
        value_parser = parse_digest
    )]
    pub sdist_hash_before_threshold: Option<String>,

    /// Interpreter version at which the sdist hash switches (default 3.9)
    #[arg(
        long = "sdist-hash-threshold",
        global = true,
        env = "PEP518_CHECK_SDIST_HASH_THRESHOLD",
        value_name = "VERSION",
        value_parser = parse_version
    )]
    pub sdist_hash_threshold: Option<PythonVersion>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the verification checks (pytest-style)
    Run {
        /// Filter checks by keyword in their id
        #[arg(short = 'k', value_name = "EXPR")]
        filter: Option<String>,
        /// Only run checks carrying this marker
        #[arg(short = 'm', value_name = "MARK", value_parser = parse_marker)]
        marker: Option<Marker>,
        /// Stop on first failure
        #[arg(short = 'x', long = "exitfirst")]
        stop_on_fail: bool,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
        /// Settings forwarded to the backend by the wheel checks (replaces the default)
        #[arg(long = "config-setting", value_name = "KEY=VALUE")]
        config_settings: Vec<ConfigSetting>,
    },

    /// List the checks and their markers
    List {
        /// Only list checks carrying this marker
        #[arg(short = 'm', value_name = "MARK", value_parser = parse_marker)]
        marker: Option<Marker>,
    },

    /// Print the backend settings schema as JSON
    Schema,
}

fn parse_marker(s: &str) -> Result<Marker, String> {
    Marker::from_name(s).ok_or_else(|| {
        let known: Vec<&str> = Marker::ALL.iter().map(|m| m.name()).collect();
        format!("unknown marker `{}` (expected one of: {})", s, known.join(", "))
    })
}

fn parse_digest(s: &str) -> Result<String, String> {
    let digest = s.trim().to_ascii_lowercase();
    if digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(digest)
    } else {
        Err(format!("`{}` is not a hex SHA-256 digest (64 characters)", s))
    }
}

fn parse_version(s: &str) -> Result<PythonVersion, String> {
    PythonVersion::parse(s).ok_or_else(|| format!("`{}` is not a Python version (e.g. 3.9)", s))
}

impl Cli {
    /// Expected sdist digests, defaults overridden by the hash flags.
    fn sdist_hashes(&self) -> SdistHashes {
        let mut hashes = SdistHashes::default();
        if let Some(digest) = &self.sdist_hash {
            hashes = hashes.with_from_threshold(digest.clone());
        }
        if let Some(digest) = &self.sdist_hash_before_threshold {
            hashes = hashes.with_before_threshold(digest.clone());
        }
        if let Some(threshold) = self.sdist_hash_threshold {
            hashes = hashes.with_threshold(threshold);
        }
        hashes
    }

    /// Harness configuration from the global flags.
    pub fn config(&self) -> HarnessConfig {
        let expectations = Expectations {
            sdist_hashes: self.sdist_hashes(),
            ..Expectations::default()
        };
        let config = HarnessConfig::new()
            .with_python(self.python.clone())
            .with_project_dir(self.project.clone())
            .with_expectations(expectations);
        match &self.find_links {
            Some(dir) => config.with_find_links(dir.clone()),
            None => config,
        }
    }

    fn verbose(&self) -> bool {
        matches!(self.command, Command::Run { verbose: true, .. })
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Initialize structured logging to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();
    init_logging(cli.verbose());

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.config();
    match cli.command {
        Command::Run {
            filter,
            marker,
            stop_on_fail,
            verbose,
            config_settings,
        } => {
            let config = if config_settings.is_empty() {
                config
            } else {
                config.with_wheel_config_settings(config_settings)
            };
            let selection = Selection {
                filter,
                marker,
                stop_on_fail,
            };
            commands::run_checks(config, &selection, verbose)
        }
        Command::List { marker } => commands::list_checks(marker),
        Command::Schema => commands::print_schema(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::try_parse_from(["pep518-check", "run", "-v", "-x", "-k", "wheel"]).unwrap();
        if let Command::Run {
            verbose,
            stop_on_fail,
            filter,
            marker,
            config_settings,
        } = cli.command
        {
            assert!(verbose);
            assert!(stop_on_fail);
            assert_eq!(filter.as_deref(), Some("wheel"));
            assert_eq!(marker, None);
            assert!(config_settings.is_empty());
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_parse_marker() {
        let cli = Cli::try_parse_from(["pep518-check", "run", "-m", "compile"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Run {
                marker: Some(Marker::Compile),
                ..
            }
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_marker() {
        assert!(Cli::try_parse_from(["pep518-check", "list", "-m", "slow"]).is_err());
    }

    #[test]
    fn test_cli_parse_config_settings() {
        let cli = Cli::try_parse_from([
            "pep518-check",
            "run",
            "--config-setting",
            "logging.level=INFO",
            "--config-setting",
            "cmake.build-type=Debug",
        ])
        .unwrap();
        if let Command::Run { config_settings, .. } = cli.command {
            assert_eq!(config_settings.len(), 2);
            assert_eq!(config_settings[0].to_arg(), "--config-setting=logging.level=INFO");
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_rejects_invalid_config_setting() {
        assert!(Cli::try_parse_from(["pep518-check", "run", "--config-setting", "logging.level=LOUD"]).is_err());
        assert!(Cli::try_parse_from(["pep518-check", "run", "--config-setting", "no-equals-sign"]).is_err());
    }

    #[test]
    fn test_cli_global_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "pep518-check",
            "run",
            "--python",
            "/usr/bin/python3.12",
            "--project",
            "/tmp/project",
            "--find-links",
            "/tmp/wheelhouse",
        ])
        .unwrap();
        let config = cli.config();
        assert_eq!(config.python, PathBuf::from("/usr/bin/python3.12"));
        assert_eq!(config.project_dir, PathBuf::from("/tmp/project"));
        assert_eq!(config.find_links, Some(PathBuf::from("/tmp/wheelhouse")));
    }

    #[test]
    fn test_cli_sdist_hash_flags_map_to_expectations() {
        let digest = "AB".repeat(32);
        let legacy = "cd".repeat(32);
        let cli = Cli::try_parse_from([
            "pep518-check",
            "run",
            "--sdist-hash",
            digest.as_str(),
            "--sdist-hash-before-threshold",
            legacy.as_str(),
            "--sdist-hash-threshold",
            "3.10",
        ])
        .unwrap();
        let hashes = cli.config().expectations.sdist_hashes;
        assert_eq!(hashes.from_threshold, "ab".repeat(32));
        assert_eq!(hashes.before_threshold, legacy);
        assert_eq!(hashes.threshold, PythonVersion::new(3, 10, 0));
    }

    #[test]
    fn test_cli_sdist_hash_defaults_when_unset() {
        let cli = Cli::try_parse_from(["pep518-check", "run", "--sdist-hash", &"0".repeat(64)]).unwrap();
        let hashes = cli.config().expectations.sdist_hashes;
        assert_eq!(hashes.from_threshold, "0".repeat(64));
        assert_eq!(hashes.before_threshold, SdistHashes::default().before_threshold);
        assert_eq!(hashes.threshold, PythonVersion::new(3, 9, 0));
    }

    #[test]
    fn test_cli_rejects_malformed_sdist_hash() {
        assert!(Cli::try_parse_from(["pep518-check", "run", "--sdist-hash", "abc"]).is_err());
        assert!(Cli::try_parse_from(["pep518-check", "run", "--sdist-hash", &"g".repeat(64)]).is_err());
        assert!(Cli::try_parse_from(["pep518-check", "run", "--sdist-hash-threshold", "three"]).is_err());
    }

    #[test]
    fn test_cli_parse_list_and_schema() {
        let cli = Cli::try_parse_from(["pep518-check", "list"]).unwrap();
        assert!(matches!(cli.command, Command::List { marker: None }));
        assert!(!cli.verbose());

        let cli = Cli::try_parse_from(["pep518-check", "schema"]).unwrap();
        assert!(matches!(cli.command, Command::Schema));
    }
}
