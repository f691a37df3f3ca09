//! Guardrail that keeps the sample project in step with the sdist expectation.
//!
//! The sdist check asserts an exact member set. A file added to (or removed from) the
//! sample project changes what the backend packs, so this test fails first with a
//! clearer message than the end-to-end check would.

use std::fs;
use std::path::Path;

use pep518_check::config::DEFAULT_PROJECT_DIR;
use pep518_check::metadata::CoreMetadata;
use pep518_check::{Expectations, SampleProject};

fn sample_project() -> SampleProject {
    SampleProject::new(Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_PROJECT_DIR))
}

#[test]
fn sample_project_holds_exactly_the_sdist_sources() {
    let mut expected = Expectations::default().sdist_sources;
    expected.sort();
    let actual = sample_project().source_files().unwrap();
    assert_eq!(
        actual, expected,
        "sample project files changed; update `Expectations::sdist_sources` together with the PKG-INFO and hash expectations"
    );
}

#[test]
fn sample_project_declares_the_expected_metadata() {
    let pyproject = fs::read_to_string(sample_project().dir().join("pyproject.toml")).unwrap();
    let expectations = Expectations::default();
    let metadata = CoreMetadata::parse(&expectations.metadata);

    let name = metadata.get("Name").unwrap();
    let version = metadata.get("Version").unwrap();
    let requires_python = metadata.get("Requires-Python").unwrap();

    assert_eq!(name, expectations.dist_name);
    assert_eq!(version, expectations.version);
    assert!(pyproject.contains(&format!("name = \"{}\"", name)));
    assert!(pyproject.contains(&format!("version = \"{}\"", version)));
    assert!(pyproject.contains(&format!("requires-python = \"{}\"", requires_python)));
    assert!(pyproject.contains("test = [\"pytest>=6.0\"]"));
}

#[test]
fn sample_extension_exports_add() {
    let source = fs::read_to_string(sample_project().dir().join("src/main.cpp")).unwrap();
    assert!(source.contains("PYBIND11_MODULE(cmake_example, m)"));
    assert!(source.contains("m.def(\"add\""));
}
