//! Wheel check (`test_pep518_wheel[...]`).

use std::collections::BTreeSet;

use crate::archive::WheelArchive;
use crate::config::Expectations;
use crate::error::{HarnessError, HarnessResult};
use crate::frontend::{BUILD_MODULE, BuildRequest, DistKind};
use crate::venv::{BOOTSTRAP_MODULE, EphemeralEnv};

use super::sdist::render_set;
use super::{Check, CheckContext, CheckReport, Marker, probe};

/// Requirement installed into the environment before building.
pub const FRONTEND_REQUIREMENT: &str = "build[virtualenv]";

/// How the frontend gets from the source tree to a wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelRoute {
    /// Default frontend behavior: sdist first, wheel built from the unpacked sdist
    SdistToWheel,
    /// `--wheel`: straight from the source tree
    WheelDirectly,
}

impl WheelRoute {
    pub fn name(self) -> &'static str {
        match self {
            WheelRoute::SdistToWheel => "sdist_to_wheel",
            WheelRoute::WheelDirectly => "wheel_directly",
        }
    }

    pub fn dist_kind(self) -> DistKind {
        match self {
            WheelRoute::SdistToWheel => DistKind::Default,
            WheelRoute::WheelDirectly => DistKind::Wheel,
        }
    }
}

/// Build a wheel inside a fresh environment, inspect its layout, install it, and probe it.
#[derive(Debug, Clone, Copy)]
pub struct WheelCheck {
    route: WheelRoute,
}

impl WheelCheck {
    pub fn new(route: WheelRoute) -> Self {
        Self { route }
    }

    pub fn route(&self) -> WheelRoute {
        self.route
    }
}

impl Check for WheelCheck {
    fn id(&self) -> String {
        format!("test_pep518_wheel[{}]", self.route.name())
    }

    fn markers(&self) -> &[Marker] {
        &[Marker::Compile, Marker::Configure, Marker::Integration]
    }

    fn skip_reason(&self, ctx: &CheckContext) -> HarnessResult<Option<String>> {
        super::require_module(ctx, BOOTSTRAP_MODULE)
    }

    #[tracing::instrument(skip_all, fields(check = "wheel", route = self.route.name()))]
    fn run(&self, ctx: &CheckContext) -> HarnessResult<CheckReport> {
        let expectations = &ctx.config.expectations;
        let mut report = CheckReport::default();

        for setting in &ctx.config.wheel_config_settings {
            setting.validate()?;
        }

        ctx.project.clear_dist()?;
        let env = EphemeralEnv::create(&ctx.interpreter, ctx.config.find_links.as_deref())?;
        env.install([FRONTEND_REQUIREMENT])?;

        let request =
            BuildRequest::new(self.route.dist_kind()).with_config_settings(ctx.config.wheel_config_settings.clone());
        env.module(BUILD_MODULE, request.module_args(), ctx.project.dir())?;

        let wheel_path = ctx.project.locate(&expectations.wheel_glob())?;

        if ctx.interpreter.supports_zip_path() {
            let wheel = WheelArchive::open(&wheel_path)?;
            let shared_object = verify_top_level(&wheel.top_level_entries(), expectations)?;
            tracing::info!(%shared_object, "wheel layout verified");
        } else {
            report.note(format!(
                "wheel layout check skipped on Python {} (no archive path traversal)",
                ctx.interpreter.version
            ));
        }

        env.install([wheel_path.as_os_str()])?;
        probe::verify_installed(&env, expectations)?;

        Ok(report)
    }
}

/// A wheel holds exactly the `.dist-info` directory and the compiled module at its root.
/// Returns the compiled module's file name; its suffix is platform-dependent.
pub fn verify_top_level(entries: &[String], expectations: &Expectations) -> HarnessResult<String> {
    let dist_info = expectations.dist_info_dir();
    let mismatch = || {
        let expected: BTreeSet<String> = [dist_info.clone(), format!("{}<platform suffix>", expectations.module_name)]
            .into_iter()
            .collect();
        let actual: BTreeSet<String> = entries.iter().cloned().collect();
        HarnessError::mismatch("wheel top-level entries", render_set(&expected), render_set(&actual))
    };

    if entries.len() != 2 || !entries.contains(&dist_info) {
        return Err(mismatch());
    }
    let shared_object = entries
        .iter()
        .find(|e| **e != dist_info)
        .ok_or_else(mismatch)?;
    if !shared_object.starts_with(&expectations.module_name) {
        return Err(mismatch());
    }
    Ok(shared_object.clone())
}
