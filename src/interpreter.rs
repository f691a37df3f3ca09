//! Host interpreter discovery and capability gating.
//!
//! The harness asks the configured interpreter for its version and `sys.platform` once per
//! session. Those two facts decide which optional assertions run:
//!
//! - the sdist hash check is skipped on Windows-family platforms,
//! - the hash literal depends on the version threshold in [`crate::config::SdistHashes`],
//! - wheel top-level enumeration is skipped below [`ZIP_PATH_MIN_VERSION`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{HarnessError, HarnessResult};
use crate::process;

/// Prints `major minor micro` on the first line and `sys.platform` on the second.
const PROBE_SCRIPT: &str = "import sys; print(*sys.version_info[:3]); print(sys.platform)";

/// Oldest interpreter whose archive-path traversal the wheel enumeration mirrors.
pub const ZIP_PATH_MIN_VERSION: PythonVersion = PythonVersion::new(3, 8, 0);

/// Interpreter version triple; ordering is lexicographic on (major, minor, micro).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
}

impl PythonVersion {
    pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self { major, minor, micro }
    }

    /// Parse `3.11.4`, `3 11 4`, or `3.11` (micro defaults to 0).
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text
            .split(|c: char| c == '.' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .map(str::parse::<u32>);
        let major = parts.next()?.ok()?;
        let minor = parts.next()?.ok()?;
        let micro = match parts.next() {
            Some(part) => part.ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self { major, minor, micro })
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

/// Snippet exiting zero when `module` is importable.
pub fn module_check_script(module: &str) -> String {
    format!("import importlib.util, sys; sys.exit(0 if importlib.util.find_spec({:?}) else 1)", module)
}

/// A probed host interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub path: PathBuf,
    pub version: PythonVersion,
    /// Value of `sys.platform` (`linux`, `darwin`, `win32`, `cygwin`, ...)
    pub platform: String,
}

impl Interpreter {
    /// Run the interpreter once and record its version and platform.
    #[tracing::instrument(skip_all, fields(python = %python.display()))]
    pub fn probe(python: &Path) -> HarnessResult<Self> {
        let mut cmd = Command::new(python);
        cmd.arg("-c").arg(PROBE_SCRIPT);
        let output = process::run_checked(&mut cmd)?;
        let interpreter = Self::from_probe_output(python, &output.stdout)?;
        tracing::info!(
            version = %interpreter.version,
            platform = %interpreter.platform,
            "probed host interpreter"
        );
        Ok(interpreter)
    }

    /// Build from the two-line output of the probe script.
    pub fn from_probe_output(python: &Path, stdout: &str) -> HarnessResult<Self> {
        let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
        let version = lines
            .next()
            .and_then(PythonVersion::parse)
            .ok_or_else(|| HarnessError::InterpreterProbe(stdout.to_string()))?;
        let platform = lines
            .next()
            .ok_or_else(|| HarnessError::InterpreterProbe(stdout.to_string()))?
            .to_string();
        Ok(Self {
            path: python.to_path_buf(),
            version,
            platform,
        })
    }

    /// Whether the interpreter can import `module` (found on its path, not executed).
    pub fn has_module(&self, module: &str) -> HarnessResult<bool> {
        let mut cmd = Command::new(&self.path);
        cmd.arg("-c").arg(module_check_script(module));
        process::succeeds(&mut cmd)
    }

    /// Windows and Cygwin produce archives whose bytes depend on filesystem metadata.
    pub fn is_windows_family(&self) -> bool {
        self.platform.starts_with("win32") || self.platform.starts_with("cygwin")
    }

    /// Whether the sdist hash is expected to be reproducible on this interpreter.
    pub fn expects_stable_sdist_hash(&self) -> bool {
        !self.is_windows_family()
    }

    /// Whether wheel top-level entries are enumerated on this interpreter.
    pub fn supports_zip_path(&self) -> bool {
        self.version >= ZIP_PATH_MIN_VERSION
    }
}
