//! Ephemeral isolated interpreter environments.
//!
//! Each wheel/install check gets its own environment in a temporary directory. The
//! environment is deleted when the [`EphemeralEnv`] is dropped, pass or fail.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::error::{HarnessError, HarnessResult};
use crate::interpreter::Interpreter;
use crate::process::{self, CommandOutput};

/// Module `-m venv` relies on to put pip into a new environment.
pub const BOOTSTRAP_MODULE: &str = "ensurepip";

/// A disposable interpreter environment.
#[derive(Debug)]
pub struct EphemeralEnv {
    root: TempDir,
    python: PathBuf,
    find_links: Option<PathBuf>,
}

/// Interpreter location inside an environment rooted at `root`.
pub fn env_python(root: &Path) -> PathBuf {
    if cfg!(windows) {
        root.join("Scripts").join("python.exe")
    } else {
        root.join("bin").join("python")
    }
}

impl EphemeralEnv {
    /// Create a fresh environment with `<host> -m venv`.
    #[tracing::instrument(skip_all, fields(host = %host.path.display()))]
    pub fn create(host: &Interpreter, find_links: Option<&Path>) -> HarnessResult<Self> {
        let root = tempfile::Builder::new()
            .prefix("pep518-env-")
            .tempdir()
            .map_err(|e| HarnessError::io(std::env::temp_dir(), e))?;

        let mut cmd = Command::new(&host.path);
        cmd.arg("-m").arg("venv").arg(root.path());
        process::run_checked(&mut cmd)?;

        let python = env_python(root.path());
        tracing::info!(env = %root.path().display(), "created ephemeral environment");
        Ok(Self {
            root,
            python,
            find_links: find_links.map(Path::to_path_buf),
        })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn python(&self) -> &Path {
        &self.python
    }

    /// A command running the environment's interpreter with its variables set.
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.env("VIRTUAL_ENV", self.root.path())
            .env("PIP_DISABLE_PIP_VERSION_CHECK", "1")
            .env("PYTHONIOENCODING", "utf-8")
            .env_remove("PYTHONHOME");
        if let Some(dir) = &self.find_links {
            cmd.env("PIP_FIND_LINKS", dir);
        }
        cmd
    }

    /// `pip install <args>` into the environment.
    pub fn install<I, S>(&self, args: I) -> HarnessResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = self.command();
        cmd.args(["-m", "pip", "install"]).args(args);
        process::run_checked(&mut cmd)
    }

    /// `python -m <module> <args>` inside the environment, from `cwd`.
    pub fn module<I, S>(&self, module: &str, args: I, cwd: &Path) -> HarnessResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = self.command();
        cmd.arg("-m").arg(module).args(args).current_dir(cwd);
        process::run_checked(&mut cmd)
    }

    /// Run a code snippet and return its stdout with surrounding whitespace trimmed.
    pub fn execute(&self, code: &str) -> HarnessResult<String> {
        let mut cmd = self.command();
        cmd.arg("-c").arg(code);
        let output = process::run_checked(&mut cmd)?;
        Ok(output.stdout.trim().to_string())
    }
}
