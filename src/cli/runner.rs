//! Check session runner (pytest-style)
//!
//! ## Reporter Trait
//!
//! The runner uses a `Reporter` trait to separate reporting from execution. The console
//! reporter prints pytest-like progress and a summary line; tests plug in a recording one.
//!
//! ## Selection
//!
//! `-k EXPR` keeps checks whose id contains EXPR, `-m MARK` keeps checks carrying the marker.
//! Everything else is deselected and counted in the summary.

use std::time::{Duration, Instant};

use crate::checks::{Check, CheckContext, Marker};

// ============================================================================
// Reporter Trait
// ============================================================================

/// Trait for reporting check execution results.
pub trait Reporter {
    /// Called once selection is done
    fn on_collection_complete(&mut self, selected: usize, deselected: usize);

    /// Called before a check runs
    fn on_check_start(&mut self, _id: &str) {}

    /// Called when a check completes
    fn on_check_complete(&mut self, id: &str, outcome: &CheckOutcome);

    /// Called when the session ends
    fn on_run_complete(&mut self, summary: &SessionSummary);
}

/// Result of running a single check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Passed; notes name optional assertions that were gated off
    Passed(Duration, Vec<String>),
    Failed(Duration, String),
    /// Not run: an environment prerequisite is missing
    Skipped(String),
}

impl CheckOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckOutcome::Failed(..))
    }
}

/// Summary of a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub deselected: usize,
    /// Checks with at least one gated-off assertion
    pub with_notes: usize,
    pub duration: Duration,
}

impl SessionSummary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    /// `2 passed, 1 failed, 1 skipped, 1 deselected, 1 with notes`
    pub fn counts(&self) -> String {
        let mut parts = Vec::new();
        if self.passed > 0 {
            parts.push(format!("{} passed", self.passed));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if self.deselected > 0 {
            parts.push(format!("{} deselected", self.deselected));
        }
        if self.with_notes > 0 {
            parts.push(format!("{} with notes", self.with_notes));
        }
        if parts.is_empty() {
            "no checks ran".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Default console reporter (pytest-style)
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
    failures: Vec<(String, String)>,
    notes: Vec<(String, String)>,
    skips: Vec<(String, String)>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            ..Self::default()
        }
    }
}

impl Reporter for ConsoleReporter {
    fn on_collection_complete(&mut self, selected: usize, deselected: usize) {
        println!("\x1b[1m=================== check session starts ===================\x1b[0m");
        if deselected > 0 {
            println!("collected {} item(s) / {} deselected", selected + deselected, deselected);
        } else {
            println!("collected {} item(s)", selected);
        }
        println!();
    }

    fn on_check_start(&mut self, id: &str) {
        if self.verbose {
            eprintln!("{} ...", id);
        }
    }

    fn on_check_complete(&mut self, id: &str, outcome: &CheckOutcome) {
        let status = match outcome {
            CheckOutcome::Passed(d, notes) => {
                for note in notes {
                    self.notes.push((id.to_string(), note.clone()));
                }
                if self.verbose {
                    format!("\x1b[32mPASSED\x1b[0m ({:.0}ms)", d.as_millis())
                } else {
                    "\x1b[32mPASSED\x1b[0m".to_string()
                }
            }
            CheckOutcome::Failed(d, message) => {
                self.failures.push((id.to_string(), message.clone()));
                if self.verbose {
                    format!("\x1b[31mFAILED\x1b[0m ({:.0}ms)", d.as_millis())
                } else {
                    "\x1b[31mFAILED\x1b[0m".to_string()
                }
            }
            CheckOutcome::Skipped(reason) => {
                self.skips.push((id.to_string(), reason.clone()));
                "\x1b[33mSKIPPED\x1b[0m".to_string()
            }
        };
        println!("{} {}", id, status);
    }

    fn on_run_complete(&mut self, summary: &SessionSummary) {
        if !self.failures.is_empty() {
            println!();
            println!("\x1b[1;31m=================== FAILURES ===================\x1b[0m");
            for (id, message) in &self.failures {
                println!();
                println!("\x1b[1m___________ {} ___________\x1b[0m", id);
                println!();
                for line in message.lines() {
                    println!("    {}", line);
                }
            }
        }

        if !self.notes.is_empty() || !self.skips.is_empty() {
            println!();
            println!("=================== short check summary info ===================");
            for (id, reason) in &self.skips {
                println!("\x1b[33mSKIPPED\x1b[0m {} - {}", id, reason);
            }
            for (id, note) in &self.notes {
                println!("\x1b[33mNOTE\x1b[0m {} - {}", id, note);
            }
        }

        println!();
        let color = if summary.success() { "\x1b[1;32m" } else { "\x1b[1;31m" };
        println!(
            "{}=================== {} in {:.2}s ===================\x1b[0m",
            color,
            summary.counts(),
            summary.duration.as_secs_f64()
        );
    }
}

// ============================================================================
// Selection and execution
// ============================================================================

/// Which checks run and when the session stops.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Keyword that must appear in the check id
    pub filter: Option<String>,
    /// Marker the check must carry
    pub marker: Option<Marker>,
    /// Stop after the first failure
    pub stop_on_fail: bool,
}

impl Selection {
    pub fn matches(&self, check: &dyn Check) -> bool {
        if let Some(keyword) = &self.filter {
            if !check.id().contains(keyword.as_str()) {
                return false;
            }
        }
        if let Some(marker) = self.marker {
            if !check.has_marker(marker) {
                return false;
            }
        }
        true
    }
}

/// Run one check, timing it and turning its error into a rendered report.
/// A missing prerequisite skips the check instead.
pub fn run_single_check(check: &dyn Check, ctx: &CheckContext) -> CheckOutcome {
    let start = Instant::now();
    match check.skip_reason(ctx) {
        Ok(Some(reason)) => {
            tracing::warn!(check = %check.id(), %reason, "skipping check");
            return CheckOutcome::Skipped(reason);
        }
        Ok(None) => {}
        Err(err) => return CheckOutcome::Failed(start.elapsed(), format!("{:?}", miette::Report::new(err))),
    }
    match check.run(ctx) {
        Ok(report) => CheckOutcome::Passed(start.elapsed(), report.notes),
        Err(err) => {
            let message = format!("{:?}", miette::Report::new(err));
            CheckOutcome::Failed(start.elapsed(), message)
        }
    }
}

/// Run the selected checks in order.
pub fn run_session(
    checks: Vec<Box<dyn Check>>,
    ctx: &CheckContext,
    selection: &Selection,
    reporter: &mut dyn Reporter,
) -> SessionSummary {
    let start = Instant::now();
    let total = checks.len();
    let selected: Vec<Box<dyn Check>> = checks.into_iter().filter(|c| selection.matches(c.as_ref())).collect();

    let mut summary = SessionSummary {
        deselected: total - selected.len(),
        ..SessionSummary::default()
    };
    reporter.on_collection_complete(selected.len(), summary.deselected);

    for check in &selected {
        let id = check.id();
        reporter.on_check_start(&id);
        tracing::info!(check = %id, "running check");

        let outcome = run_single_check(check.as_ref(), ctx);
        match &outcome {
            CheckOutcome::Passed(_, notes) => {
                summary.passed += 1;
                if !notes.is_empty() {
                    summary.with_notes += 1;
                }
            }
            CheckOutcome::Failed(..) => summary.failed += 1,
            CheckOutcome::Skipped(_) => summary.skipped += 1,
        }
        reporter.on_check_complete(&id, &outcome);

        if selection.stop_on_fail && outcome.is_failure() {
            break;
        }
    }

    summary.duration = start.elapsed();
    reporter.on_run_complete(&summary);
    summary
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checks::CheckReport;
    use crate::config::HarnessConfig;
    use crate::error::{HarnessError, HarnessResult};
    use crate::interpreter::{Interpreter, PythonVersion};
    use crate::project::SampleProject;
    use std::path::PathBuf;

    struct FakeCheck {
        id: &'static str,
        markers: Vec<Marker>,
        fail: bool,
        notes: Vec<String>,
        missing: Option<&'static str>,
    }

    impl FakeCheck {
        fn passing(id: &'static str, markers: &[Marker]) -> Box<dyn Check> {
            Box::new(Self {
                id,
                markers: markers.to_vec(),
                fail: false,
                notes: Vec::new(),
                missing: None,
            })
        }

        fn failing(id: &'static str) -> Box<dyn Check> {
            Box::new(Self {
                id,
                markers: vec![Marker::Integration],
                fail: true,
                notes: Vec::new(),
                missing: None,
            })
        }
    }

    impl Check for FakeCheck {
        fn id(&self) -> String {
            self.id.to_string()
        }

        fn markers(&self) -> &[Marker] {
            &self.markers
        }

        fn skip_reason(&self, _ctx: &CheckContext) -> HarnessResult<Option<String>> {
            Ok(self.missing.map(|m| format!("host interpreter has no `{}` module", m)))
        }

        fn run(&self, _ctx: &CheckContext) -> HarnessResult<CheckReport> {
            if self.fail {
                Err(HarnessError::mismatch("installed version", "0.0.1", "0.0.2"))
            } else {
                Ok(CheckReport {
                    notes: self.notes.clone(),
                })
            }
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        collected: Option<(usize, usize)>,
        completed: Vec<(String, bool)>,
        finished: bool,
    }

    impl Reporter for RecordingReporter {
        fn on_collection_complete(&mut self, selected: usize, deselected: usize) {
            self.collected = Some((selected, deselected));
        }

        fn on_check_complete(&mut self, id: &str, outcome: &CheckOutcome) {
            self.completed.push((id.to_string(), outcome.is_failure()));
        }

        fn on_run_complete(&mut self, _summary: &SessionSummary) {
            self.finished = true;
        }
    }

    fn ctx() -> CheckContext {
        CheckContext {
            config: HarnessConfig::default(),
            interpreter: Interpreter {
                path: PathBuf::from("python3"),
                version: PythonVersion::new(3, 11, 0),
                platform: "linux".to_string(),
            },
            project: SampleProject::new("packages/simple_pyproject_ext"),
        }
    }

    #[test]
    fn test_runs_all_and_counts() {
        let checks = vec![
            FakeCheck::passing("test_a", &[Marker::Integration]),
            FakeCheck::failing("test_b"),
            FakeCheck::passing("test_c", &[Marker::Integration]),
        ];
        let mut reporter = RecordingReporter::default();
        let summary = run_session(checks, &ctx(), &Selection::default(), &mut reporter);

        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.success());
        assert_eq!(reporter.collected, Some((3, 0)));
        assert_eq!(
            reporter.completed,
            vec![
                ("test_a".to_string(), false),
                ("test_b".to_string(), true),
                ("test_c".to_string(), false),
            ]
        );
        assert!(reporter.finished);
    }

    #[test]
    fn test_stop_on_first_failure() {
        let checks = vec![FakeCheck::failing("test_a"), FakeCheck::passing("test_b", &[])];
        let selection = Selection {
            stop_on_fail: true,
            ..Selection::default()
        };
        let mut reporter = RecordingReporter::default();
        let summary = run_session(checks, &ctx(), &selection, &mut reporter);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.passed, 0);
        assert_eq!(reporter.completed.len(), 1);
    }

    #[test]
    fn test_keyword_selection() {
        let checks = vec![
            FakeCheck::passing("test_pep518_sdist", &[Marker::Integration]),
            FakeCheck::passing("test_pep518_wheel[sdist_to_wheel]", &[Marker::Compile]),
            FakeCheck::passing("test_pep518_wheel[wheel_directly]", &[Marker::Compile]),
        ];
        let selection = Selection {
            filter: Some("wheel".to_string()),
            ..Selection::default()
        };
        let mut reporter = RecordingReporter::default();
        let summary = run_session(checks, &ctx(), &selection, &mut reporter);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.deselected, 1);
        assert_eq!(summary.counts(), "2 passed, 1 deselected");
    }

    #[test]
    fn test_marker_selection() {
        let checks = vec![
            FakeCheck::passing("test_pep518_sdist", &[Marker::Integration]),
            FakeCheck::passing("test_pep518_pip", &[Marker::Compile, Marker::Integration]),
        ];
        let selection = Selection {
            marker: Some(Marker::Compile),
            ..Selection::default()
        };
        let mut reporter = RecordingReporter::default();
        run_session(checks, &ctx(), &selection, &mut reporter);
        assert_eq!(reporter.completed, vec![("test_pep518_pip".to_string(), false)]);
    }

    #[test]
    fn test_notes_are_counted() {
        let checks: Vec<Box<dyn Check>> = vec![Box::new(FakeCheck {
            id: "test_pep518_sdist",
            markers: vec![Marker::Integration],
            fail: false,
            notes: vec!["sdist hash check skipped on win32".to_string()],
            missing: None,
        })];
        let mut reporter = RecordingReporter::default();
        let summary = run_session(checks, &ctx(), &Selection::default(), &mut reporter);
        assert_eq!(summary.with_notes, 1);
        assert!(summary.success());
        assert_eq!(summary.counts(), "1 passed, 1 with notes");
    }

    #[test]
    fn test_missing_prerequisite_skips() {
        let checks: Vec<Box<dyn Check>> = vec![
            Box::new(FakeCheck {
                id: "test_pep518_sdist",
                markers: vec![Marker::Integration],
                fail: true,
                notes: Vec::new(),
                missing: Some("build"),
            }),
            FakeCheck::passing("test_pep518_pip", &[Marker::Integration]),
        ];
        let mut reporter = RecordingReporter::default();
        let summary = run_session(checks, &ctx(), &Selection::default(), &mut reporter);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.passed, 1);
        assert!(summary.success());
        assert_eq!(summary.counts(), "1 passed, 1 skipped");
        assert_eq!(reporter.completed[0], ("test_pep518_sdist".to_string(), false));
    }

    #[test]
    fn test_skip_reason_names_module() {
        let check = FakeCheck {
            id: "test_pep518_sdist",
            markers: vec![Marker::Integration],
            fail: false,
            notes: Vec::new(),
            missing: Some("build"),
        };
        assert_eq!(
            run_single_check(&check, &ctx()),
            CheckOutcome::Skipped("host interpreter has no `build` module".to_string())
        );
    }

    #[test]
    fn test_failure_message_names_mismatch() {
        let check = FakeCheck::failing("test_b");
        let outcome = run_single_check(check.as_ref(), &ctx());
        match outcome {
            CheckOutcome::Failed(_, message) => assert!(message.contains("installed version mismatch")),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_session_counts() {
        assert_eq!(SessionSummary::default().counts(), "no checks ran");
    }
}
