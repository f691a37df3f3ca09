//! Subprocess execution.
//!
//! Every external tool the harness touches (`python -m build`, `pip`, `venv`, probe
//! snippets) goes through [`run_checked`]: output is captured, a non-zero exit becomes
//! [`HarnessError::CommandFailed`], and the full command line is logged at `debug`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::process::{Command, Stdio};
use std::time::Instant;

use crate::error::{HarnessError, HarnessResult};

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Render a command line for logs and error messages.
pub fn describe(cmd: &Command) -> String {
    let mut parts = vec![quote(&cmd.get_program().to_string_lossy())];
    parts.extend(cmd.get_args().map(|a| quote(&a.to_string_lossy())));
    parts.join(" ")
}

fn quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        arg.to_string()
    } else {
        format!("{:?}", arg)
    }
}

/// Run a command to completion and fail on non-zero exit.
pub fn run_checked(cmd: &mut Command) -> HarnessResult<CommandOutput> {
    let line = describe(cmd);
    match cmd.get_current_dir() {
        Some(dir) => tracing::debug!(cwd = %dir.display(), "$ {}", line),
        None => tracing::debug!("$ {}", line),
    }

    let start = Instant::now();
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| HarnessError::Spawn {
            program: cmd.get_program().to_string_lossy().to_string(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    tracing::debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        status = %output.status,
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        "command finished"
    );
    tracing::trace!(%stdout, %stderr, "command output");

    if !output.status.success() {
        // pip and build report most failures on stdout
        let report = if stderr.trim().is_empty() { &stdout } else { &stderr };
        return Err(HarnessError::command_failed(line, output.status.to_string(), report));
    }

    Ok(CommandOutput { stdout, stderr })
}

/// Run a command to completion and report whether it exited zero. Output is discarded.
pub fn succeeds(cmd: &mut Command) -> HarnessResult<bool> {
    tracing::debug!("$ {}", describe(cmd));
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| HarnessError::Spawn {
            program: cmd.get_program().to_string_lossy().to_string(),
            source,
        })?;
    Ok(output.status.success())
}
