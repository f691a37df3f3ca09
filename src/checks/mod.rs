//! Verification checks
//!
//! Each check is one linear operation against the sample project:
//!
//! - `sdist` - build the source distribution and inspect it
//! - `wheel` - build a wheel (through the sdist or directly), inspect, install, probe
//! - `install` - `pip install` the project tree, probe
//!
//! Checks sit behind the [`Check`] trait so the runner can select, skip, and report them
//! without knowing what they do, and so runner logic can be tested with stand-ins.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod install;
pub mod probe;
pub mod sdist;
pub mod wheel;

use std::fmt;

use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::interpreter::Interpreter;
use crate::project::SampleProject;

pub use install::DirectInstallCheck;
pub use sdist::SdistCheck;
pub use wheel::{WheelCheck, WheelRoute};

/// Classification tags used for selection (`-m`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Drives the external toolchain end to end
    Integration,
    /// Compiles the native extension
    Compile,
    /// Runs the CMake configure step
    Configure,
}

impl Marker {
    pub const ALL: [Marker; 3] = [Marker::Integration, Marker::Compile, Marker::Configure];

    pub fn name(self) -> &'static str {
        match self {
            Marker::Integration => "integration",
            Marker::Compile => "compile",
            Marker::Configure => "configure",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a check may read. Built once per session.
#[derive(Debug, Clone)]
pub struct CheckContext {
    pub config: HarnessConfig,
    pub interpreter: Interpreter,
    pub project: SampleProject,
}

/// Result of a passing check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Optional assertions that were gated off, with the reason
    pub notes: Vec<String>,
}

impl CheckReport {
    pub fn note(&mut self, note: impl Into<String>) {
        let note = note.into();
        tracing::warn!("{}", note);
        self.notes.push(note);
    }
}

/// A verification check.
pub trait Check {
    /// Stable identifier (`test_pep518_wheel[wheel_directly]`)
    fn id(&self) -> String;

    fn markers(&self) -> &[Marker];

    fn run(&self, ctx: &CheckContext) -> HarnessResult<CheckReport>;

    /// Why the check cannot run in this environment, if it cannot.
    fn skip_reason(&self, _ctx: &CheckContext) -> HarnessResult<Option<String>> {
        Ok(None)
    }

    fn has_marker(&self, marker: Marker) -> bool {
        self.markers().contains(&marker)
    }
}

/// Skip reason when the host interpreter cannot import `module`.
pub(crate) fn require_module(ctx: &CheckContext, module: &str) -> HarnessResult<Option<String>> {
    if ctx.interpreter.has_module(module)? {
        Ok(None)
    } else {
        Ok(Some(format!(
            "host interpreter {} has no `{}` module",
            ctx.interpreter.path.display(),
            module
        )))
    }
}

/// All checks, in execution order.
pub fn all_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(SdistCheck),
        Box::new(WheelCheck::new(WheelRoute::SdistToWheel)),
        Box::new(WheelCheck::new(WheelRoute::WheelDirectly)),
        Box::new(DirectInstallCheck),
    ]
}
