//! Shared fixtures for the integration tests: sdist and wheel archives built on the fly,
//! and a stand-in `python` that answers the harness the way a real toolchain would.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use pep518_check::metadata::EXPECTED_PKG_INFO;
use zip::write::SimpleFileOptions;

// =============================================================================
// Archives
// =============================================================================

pub fn write_sdist(path: &Path, members: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, contents) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_cksum();
        builder.append_data(&mut header, name, contents.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

pub fn expected_sdist_members() -> Vec<(&'static str, &'static str)> {
    vec![
        ("cmake-example-0.0.1/CMakeLists.txt", "cmake_minimum_required(VERSION 3.15)\n"),
        ("cmake-example-0.0.1/pyproject.toml", "[project]\nname = \"cmake-example\"\n"),
        ("cmake-example-0.0.1/src/main.cpp", "int add(int i, int j) { return i + j; }\n"),
        ("cmake-example-0.0.1/PKG-INFO", EXPECTED_PKG_INFO),
    ]
}

pub fn write_wheel(path: &Path, members: &[&str]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for name in members {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(b"payload").unwrap();
    }
    zip.finish().unwrap();
}

pub const WHEEL_NAME: &str = "cmake_example-0.0.1-cp311-cp311-linux_x86_64.whl";

pub const GOOD_WHEEL: &[&str] = &[
    "cmake_example.cpython-311-x86_64-linux-gnu.so",
    "cmake_example-0.0.1.dist-info/METADATA",
    "cmake_example-0.0.1.dist-info/WHEEL",
    "cmake_example-0.0.1.dist-info/RECORD",
];

// =============================================================================
// Stand-in toolchain
// =============================================================================

/// How the stand-in interpreter behaves.
pub struct StubOptions {
    /// `sys.version_info[:3]`, space separated
    pub version: &'static str,
    pub platform: &'static str,
    /// A module the interpreter reports as not importable
    pub missing_module: Option<&'static str>,
    pub wheel_members: Vec<&'static str>,
    /// What the installed package reports as `__version__`
    pub installed_version: &'static str,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            version: "3 11 4",
            platform: "linux",
            missing_module: None,
            wheel_members: GOOD_WHEEL.to_vec(),
            installed_version: "0.0.1",
        }
    }
}

/// A temp dir holding a stand-in `python`, its fixtures, its call log, and a project dir.
#[cfg(unix)]
pub struct StubToolchain {
    pub root: tempfile::TempDir,
    pub python: PathBuf,
    pub project_dir: PathBuf,
    pub sdist_fixture: PathBuf,
    log: PathBuf,
}

#[cfg(unix)]
impl StubToolchain {
    pub fn new(options: StubOptions) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let fixtures = root.path().join("fixtures");
        let project_dir = root.path().join("project");
        fs::create_dir_all(&fixtures).unwrap();
        fs::create_dir_all(&project_dir).unwrap();

        let sdist_fixture = fixtures.join("cmake-example-0.0.1.tar.gz");
        write_sdist(&sdist_fixture, &expected_sdist_members());
        let wheel_fixture = fixtures.join(WHEEL_NAME);
        write_wheel(&wheel_fixture, &options.wheel_members);

        let log = root.path().join("calls.log");
        let python = root.path().join("python");
        let script = format!(
            r#"#!/bin/sh
echo "$*" >> "{log}"
if [ "$1" = "-c" ]; then
  case "$2" in
    *version_info*) printf '%s\n%s\n' "{version}" "{platform}" ;;
    *find_spec*)
      case "$2" in *'"{missing}"'*) exit 1 ;; esac ;;
    *__version__*) echo "{installed}" ;;
    *add*) echo 3 ;;
  esac
  exit 0
fi
if [ "$1" = "-m" ]; then
  case "$2" in
    venv) mkdir -p "$3/bin" && cp "$0" "$3/bin/python" ;;
    build)
      mkdir -p dist
      case "$*" in
        *--sdist*) cp "{sdist}" dist/ ;;
        *) cp "{wheel}" dist/ ;;
      esac ;;
  esac
fi
exit 0
"#,
            log = log.display(),
            version = options.version,
            platform = options.platform,
            missing = options.missing_module.unwrap_or("-"),
            installed = options.installed_version,
            sdist = sdist_fixture.display(),
            wheel = wheel_fixture.display(),
        );
        fs::write(&python, script).unwrap();
        fs::set_permissions(&python, fs::Permissions::from_mode(0o755)).unwrap();

        Self {
            root,
            python,
            project_dir,
            sdist_fixture,
            log,
        }
    }

    /// Every invocation so far, one argument line each.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.project_dir.join("dist")
    }
}
