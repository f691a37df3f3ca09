//! Probes run inside an environment after the sample package is installed.

use crate::config::Expectations;
use crate::error::{HarnessResult, ensure_eq};
use crate::venv::EphemeralEnv;

/// Snippet printing the installed package's `__version__`.
pub fn version_probe(module: &str) -> String {
    format!("import {module}; print({module}.__version__)")
}

/// Snippet printing the result of the exported `add(1, 2)`.
pub fn add_probe(module: &str) -> String {
    format!("import {module}; print({module}.add(1, 2))")
}

/// Import the package, then compare its version and `add(1, 2)` with the expectations.
#[tracing::instrument(skip_all, fields(module = %expectations.module_name))]
pub fn verify_installed(env: &EphemeralEnv, expectations: &Expectations) -> HarnessResult<()> {
    let version = env.execute(&version_probe(&expectations.module_name))?;
    ensure_eq("installed version", &expectations.version, &version)?;

    let sum = env.execute(&add_probe(&expectations.module_name))?;
    ensure_eq("add(1, 2) output", &expectations.add_result, &sum)?;

    tracing::info!(%version, "installed package answers probes");
    Ok(())
}
