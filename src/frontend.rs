//! Packaging frontend invocations (`python -m build`).

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use crate::settings::ConfigSetting;

/// Frontend module run with `-m`.
pub const BUILD_MODULE: &str = "build";

/// Which distributions the frontend is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistKind {
    /// No flag: build the sdist, then the wheel from the unpacked sdist
    #[default]
    Default,
    /// `--sdist`
    Sdist,
    /// `--wheel`: build the wheel straight from the source tree
    Wheel,
}

impl DistKind {
    pub fn flag(self) -> Option<&'static str> {
        match self {
            DistKind::Default => None,
            DistKind::Sdist => Some("--sdist"),
            DistKind::Wheel => Some("--wheel"),
        }
    }
}

/// One frontend invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRequest {
    pub kind: DistKind,
    pub config_settings: Vec<ConfigSetting>,
}

impl BuildRequest {
    pub fn new(kind: DistKind) -> Self {
        Self {
            kind,
            config_settings: Vec::new(),
        }
    }

    pub fn with_config_settings(mut self, settings: impl IntoIterator<Item = ConfigSetting>) -> Self {
        self.config_settings.extend(settings);
        self
    }

    /// Arguments after `-m build`: settings first, then the distribution flag.
    pub fn module_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = self
            .config_settings
            .iter()
            .map(|s| OsString::from(s.to_arg()))
            .collect();
        if let Some(flag) = self.kind.flag() {
            args.push(OsString::from(flag));
        }
        args
    }

    /// `<python> -m build <module_args>` with `project_dir` as the working directory.
    pub fn command(&self, python: &Path, project_dir: &Path) -> Command {
        let mut cmd = Command::new(python);
        cmd.arg("-m")
            .arg(BUILD_MODULE)
            .args(self.module_args())
            .current_dir(project_dir);
        cmd
    }
}
