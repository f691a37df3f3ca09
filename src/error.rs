//! Harness error taxonomy.
//!
//! Three kinds of failure end a check:
//!
//! - a subprocess could not be launched or exited non-zero ([`HarnessError::Spawn`],
//!   [`HarnessError::CommandFailed`]),
//! - an artifact lookup matched zero or several files ([`HarnessError::ArtifactCount`]),
//! - a produced artifact or probe output differs from what is expected ([`HarnessError::Mismatch`]).
//!
//! Everything else (I/O, archive decoding, probe parsing) is plumbing around those three.
//! None of them is retried.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use similar::TextDiff;
use thiserror::Error;

/// Result alias used across the harness.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Number of trailing stderr lines kept in a [`HarnessError::CommandFailed`] report.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("failed to launch `{program}`")]
    #[diagnostic(code(pep518::spawn), help("is `{program}` installed and on PATH?"))]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}")]
    #[diagnostic(code(pep518::command_failed))]
    CommandFailed {
        command: String,
        status: String,
        #[help]
        stderr_tail: String,
    },

    #[error("expected exactly one artifact matching `{pattern}` in {}, found {found}", dir.display())]
    #[diagnostic(code(pep518::artifact_count))]
    ArtifactCount { pattern: String, dir: PathBuf, found: usize },

    #[error("{what} mismatch")]
    #[diagnostic(code(pep518::mismatch))]
    Mismatch {
        what: String,
        expected: String,
        actual: String,
        #[help]
        diff: String,
    },

    #[error("cannot read archive {}", path.display())]
    #[diagnostic(code(pep518::archive))]
    Archive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read wheel {}", path.display())]
    #[diagnostic(code(pep518::wheel))]
    Wheel {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("archive {} has no member `{member}`", path.display())]
    #[diagnostic(code(pep518::missing_member))]
    MissingMember { path: PathBuf, member: String },

    #[error("member `{member}` is not valid UTF-8")]
    #[diagnostic(code(pep518::encoding))]
    Encoding { member: String },

    #[error("unexpected interpreter probe output: {0:?}")]
    #[diagnostic(code(pep518::interpreter_probe))]
    InterpreterProbe(String),

    #[error("invalid config setting `{setting}`: {reason}")]
    #[diagnostic(
        code(pep518::config_setting),
        help("run `pep518-check schema` to list the accepted keys")
    )]
    InvalidSetting { setting: String, reason: String },

    #[error("invalid artifact pattern")]
    #[diagnostic(code(pep518::glob))]
    Glob(#[from] globset::Error),

    #[error("I/O error on {}", path.display())]
    #[diagnostic(code(pep518::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    /// Build a content mismatch with a unified diff of expected vs. actual.
    pub fn mismatch(what: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        let expected = expected.into();
        let actual = actual.into();
        let diff = TextDiff::from_lines(&expected, &actual)
            .unified_diff()
            .context_radius(3)
            .header("expected", "actual")
            .to_string();
        Self::Mismatch {
            what: what.into(),
            expected,
            actual,
            diff,
        }
    }

    /// Build a command failure, keeping only the tail of stderr.
    pub fn command_failed(command: impl Into<String>, status: impl Into<String>, stderr: &str) -> Self {
        let lines: Vec<&str> = stderr.lines().collect();
        let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
        Self::CommandFailed {
            command: command.into(),
            status: status.into(),
            stderr_tail: lines[start..].join("\n"),
        }
    }

    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a content mismatch rather than an environment failure.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}

/// Compare two values and fail with a [`HarnessError::Mismatch`] when they differ.
pub fn ensure_eq(what: &str, expected: &str, actual: &str) -> HarnessResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(HarnessError::mismatch(what, expected, actual))
    }
}
