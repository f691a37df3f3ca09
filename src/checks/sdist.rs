//! Source distribution check (`test_pep518_sdist`).

use std::collections::BTreeSet;
use std::path::Path;

use crate::archive::{SdistArchive, sha256_file};
use crate::config::Expectations;
use crate::error::{HarnessError, HarnessResult, ensure_eq};
use crate::frontend::{BUILD_MODULE, BuildRequest, DistKind};
use crate::metadata::verify_pkg_info;
use crate::process;

use super::{Check, CheckContext, CheckReport, Marker};

/// Build the sdist with the host interpreter and inspect name, hash, members, `PKG-INFO`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdistCheck;

impl Check for SdistCheck {
    fn id(&self) -> String {
        "test_pep518_sdist".to_string()
    }

    fn markers(&self) -> &[Marker] {
        &[Marker::Integration]
    }

    fn skip_reason(&self, ctx: &CheckContext) -> HarnessResult<Option<String>> {
        super::require_module(ctx, BUILD_MODULE)
    }

    #[tracing::instrument(skip_all, fields(check = "sdist"))]
    fn run(&self, ctx: &CheckContext) -> HarnessResult<CheckReport> {
        let expectations = &ctx.config.expectations;
        let mut report = CheckReport::default();

        ctx.project.clear_dist()?;
        let mut cmd = BuildRequest::new(DistKind::Sdist).command(&ctx.interpreter.path, ctx.project.dir());
        process::run_checked(&mut cmd)?;

        let sdist_path = ctx.project.sole_artifact()?;
        let file_name = sdist_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        ensure_eq("sdist file name", &expectations.sdist_file_name(), &file_name)?;

        if ctx.interpreter.expects_stable_sdist_hash() {
            let digest = sha256_file(&sdist_path)?;
            let expected = expectations.sdist_hashes.for_version(ctx.interpreter.version);
            ensure_eq("sdist sha256", expected, &digest)?;
            tracing::debug!(%digest, "sdist hash matches");
        } else {
            report.note(format!(
                "sdist hash check skipped on {} (archive bytes depend on filesystem metadata)",
                ctx.interpreter.platform
            ));
        }

        verify_contents(&sdist_path, expectations)?;

        tracing::info!(sdist = %sdist_path.display(), "sdist verified");
        Ok(report)
    }
}

/// The sdist holds exactly the expected members and its `PKG-INFO` matches byte for byte.
pub fn verify_contents(sdist_path: &Path, expectations: &Expectations) -> HarnessResult<()> {
    let sdist = SdistArchive::open(sdist_path);
    let members = sdist.member_set()?;
    let expected_members: BTreeSet<String> = expectations.sdist_members().into_iter().collect();
    if members != expected_members {
        return Err(HarnessError::mismatch(
            "sdist members",
            render_set(&expected_members),
            render_set(&members),
        ));
    }

    let pkg_info = sdist.read_member_text(&expectations.pkg_info_member())?;
    verify_pkg_info(&expectations.metadata, &pkg_info)
}

/// One name per line, sorted, for readable diffs.
pub(crate) fn render_set(set: &BTreeSet<String>) -> String {
    set.iter().map(|s| format!("{}\n", s)).collect()
}
