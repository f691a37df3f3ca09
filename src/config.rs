//! Harness configuration
//!
//! [`HarnessConfig`] says where things are (interpreter, sample project, local wheelhouse);
//! [`Expectations`] says what the sample project must produce.

use std::path::PathBuf;

use crate::interpreter::PythonVersion;
use crate::metadata::EXPECTED_PKG_INFO;
use crate::settings::ConfigSetting;

/// Default host interpreter.
pub const DEFAULT_PYTHON: &str = "python3";

/// Default location of the sample project, relative to the working directory.
pub const DEFAULT_PROJECT_DIR: &str = "packages/simple_pyproject_ext";

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Host interpreter used for `-m build`, `-m venv`, and version gating
    pub python: PathBuf,
    /// Sample project directory (never mutated apart from its `dist/`)
    pub project_dir: PathBuf,
    /// Local wheel directory handed to pip inside ephemeral environments
    pub find_links: Option<PathBuf>,
    /// Settings forwarded to the backend by the wheel checks
    pub wheel_config_settings: Vec<ConfigSetting>,
    /// What the sample project must produce
    pub expectations: Expectations,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            python: PathBuf::from(DEFAULT_PYTHON),
            project_dir: PathBuf::from(DEFAULT_PROJECT_DIR),
            find_links: None,
            wheel_config_settings: vec![ConfigSetting::new("logging.level", "DEBUG")],
            expectations: Expectations::default(),
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host interpreter
    pub fn with_python(mut self, python: impl Into<PathBuf>) -> Self {
        self.python = python.into();
        self
    }

    /// Set the sample project directory
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    /// Set a local wheel directory for pip
    pub fn with_find_links(mut self, dir: impl Into<PathBuf>) -> Self {
        self.find_links = Some(dir.into());
        self
    }

    /// Replace the settings forwarded by the wheel checks
    pub fn with_wheel_config_settings(mut self, settings: Vec<ConfigSetting>) -> Self {
        self.wheel_config_settings = settings;
        self
    }

    /// Replace the expectations
    pub fn with_expectations(mut self, expectations: Expectations) -> Self {
        self.expectations = expectations;
        self
    }
}

/// Expected SHA-256 of the sdist, keyed on an interpreter version threshold.
///
/// The backend serializes metadata differently on either side of the threshold, so the
/// same inputs produce one of two archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdistHashes {
    /// Digest for interpreters older than `threshold`
    pub before_threshold: String,
    /// Digest for interpreters at or above `threshold`
    pub from_threshold: String,
    pub threshold: PythonVersion,
}

impl SdistHashes {
    /// Replace the digest for interpreters at or above the threshold
    pub fn with_from_threshold(mut self, digest: impl Into<String>) -> Self {
        self.from_threshold = digest.into();
        self
    }

    /// Replace the digest for interpreters below the threshold
    pub fn with_before_threshold(mut self, digest: impl Into<String>) -> Self {
        self.before_threshold = digest.into();
        self
    }

    pub fn with_threshold(mut self, threshold: PythonVersion) -> Self {
        self.threshold = threshold;
        self
    }

    /// Pick the digest that applies to `version`.
    pub fn for_version(&self, version: PythonVersion) -> &str {
        if version < self.threshold {
            &self.before_threshold
        } else {
            &self.from_threshold
        }
    }
}

impl Default for SdistHashes {
    fn default() -> Self {
        Self {
            before_threshold: "0f2ef937723753cb4df8154cddfc71d9b6451738f55392b184a0ca49ed8b2364".to_string(),
            from_threshold: "f22eaa307456a812fce6b9bd7386189c9c7e3bd10bbc6feee4f5ab0b1733b272".to_string(),
            threshold: PythonVersion::new(3, 9, 0),
        }
    }
}

/// What the sample project must produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectations {
    /// Distribution name as it appears in the sdist file name (`cmake-example`)
    pub dist_name: String,
    /// Importable module name, also the wheel name prefix (`cmake_example`)
    pub module_name: String,
    pub version: String,
    pub sdist_hashes: SdistHashes,
    /// Core metadata (`PKG-INFO`) embedded in the sdist, byte-exact
    pub metadata: String,
    /// Files of the sample project that must end up in the sdist, besides `PKG-INFO`
    pub sdist_sources: Vec<String>,
    /// Expected output of the `add(1, 2)` probe
    pub add_result: String,
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            dist_name: "cmake-example".to_string(),
            module_name: "cmake_example".to_string(),
            version: "0.0.1".to_string(),
            sdist_hashes: SdistHashes::default(),
            metadata: EXPECTED_PKG_INFO.to_string(),
            sdist_sources: vec![
                "CMakeLists.txt".to_string(),
                "pyproject.toml".to_string(),
                "src/main.cpp".to_string(),
            ],
            add_result: "3".to_string(),
        }
    }
}

impl Expectations {
    /// Top-level directory of the sdist (`cmake-example-0.0.1`)
    pub fn sdist_root(&self) -> String {
        format!("{}-{}", self.dist_name, self.version)
    }

    /// File name of the sdist (`cmake-example-0.0.1.tar.gz`)
    pub fn sdist_file_name(&self) -> String {
        format!("{}.tar.gz", self.sdist_root())
    }

    /// Glob for the wheel (`cmake_example-0.0.1-*.whl`); the tags are platform-dependent
    pub fn wheel_glob(&self) -> String {
        format!("{}-{}-*.whl", self.module_name, self.version)
    }

    /// `.dist-info` directory inside the wheel
    pub fn dist_info_dir(&self) -> String {
        format!("{}-{}.dist-info", self.module_name, self.version)
    }

    /// Member path of the core metadata inside the sdist
    pub fn pkg_info_member(&self) -> String {
        format!("{}/PKG-INFO", self.sdist_root())
    }

    /// Every member path the sdist must contain, and nothing else
    pub fn sdist_members(&self) -> Vec<String> {
        let root = self.sdist_root();
        let mut members: Vec<String> = self
            .sdist_sources
            .iter()
            .map(|source| format!("{}/{}", root, source))
            .collect();
        members.push(self.pkg_info_member());
        members
    }
}
