//! Direct source-tree installation check (`test_pep518_pip`).

use std::ffi::OsStr;

use crate::error::HarnessResult;
use crate::venv::{BOOTSTRAP_MODULE, EphemeralEnv};

use super::{Check, CheckContext, CheckReport, Marker, probe};

/// `pip install -v <project>` into a fresh environment, then probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectInstallCheck;

impl Check for DirectInstallCheck {
    fn id(&self) -> String {
        "test_pep518_pip".to_string()
    }

    fn markers(&self) -> &[Marker] {
        &[Marker::Compile, Marker::Configure, Marker::Integration]
    }

    fn skip_reason(&self, ctx: &CheckContext) -> HarnessResult<Option<String>> {
        super::require_module(ctx, BOOTSTRAP_MODULE)
    }

    #[tracing::instrument(skip_all, fields(check = "pip"))]
    fn run(&self, ctx: &CheckContext) -> HarnessResult<CheckReport> {
        let env = EphemeralEnv::create(&ctx.interpreter, ctx.config.find_links.as_deref())?;
        env.install([OsStr::new("-v"), ctx.project.dir().as_os_str()])?;
        probe::verify_installed(&env, &ctx.config.expectations)?;
        Ok(CheckReport::default())
    }
}
