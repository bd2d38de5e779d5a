//! Runner - Executing selected fixtures and reporting the results
//!
//! Provides:
//! - Selection by exact group and/or name
//! - Sequential execution on the calling thread
//! - Result aggregation into a [`RunSummary`]
//! - Reports at a chosen [`OutputMode`] through an injectable [`Output`]
//!
//! A run that selects nothing reports `no tests found` but still counts as
//! passed. Callers that need to tell the two apart should check
//! [`RunSummary::no_tests_found`].

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::fixture::{Fixture, FixtureId};
use crate::output::{Output, Status, StdoutOutput};
use crate::registry::Registry;

/// How much the runner prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub enum OutputMode {
    /// Nothing at all
    Silent,
    /// Per-fixture results, failure messages and the final summary
    #[default]
    Normal,
    /// Everything in `Normal` plus a line before each fixture starts
    Verbose,
}

impl OutputMode {
    /// Lowercase name, as accepted by `FromStr`
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Silent => "silent",
            OutputMode::Normal => "normal",
            OutputMode::Verbose => "verbose",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = ParseOutputModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(ParseOutputModeError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown output mode.
///
/// Accepted values (case-insensitive) are `"silent"`, `"normal"` and
/// `"verbose"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid output mode: {0:?}")]
pub struct ParseOutputModeError(String);

/// Which fixtures a run executes.
///
/// An absent filter matches everything. Present filters must equal the
/// fixture's group or name exactly (case-sensitive).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    group: Option<String>,
    name: Option<String>,
}

impl Selection {
    /// Every fixture
    pub fn all() -> Self {
        Self::default()
    }

    /// Every fixture in `group`
    pub fn group(group: impl Into<String>) -> Self {
        Self::all().with_group(group)
    }

    /// The single fixture `group/name`
    pub fn one(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self::all().with_group(group).with_name(name)
    }

    /// Selection from optional filters
    pub fn from_filters(group: Option<&str>, name: Option<&str>) -> Self {
        Self {
            group: group.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    /// Restrict the selection to `group`
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Restrict the selection to fixtures called `name`
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The group filter, if any
    pub fn group_filter(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// The name filter, if any
    pub fn name_filter(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns true if the identifier passes both filters
    pub fn matches_id(&self, id: &FixtureId) -> bool {
        self.group.as_deref().is_none_or(|group| group == id.group())
            && self.name.as_deref().is_none_or(|name| name == id.name())
    }

    /// Returns true if the fixture passes both filters
    pub fn matches(&self, fixture: &Fixture) -> bool {
        self.matches_id(fixture.id())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "group={} name={}",
            self.group.as_deref().unwrap_or("*"),
            self.name.as_deref().unwrap_or("*")
        )
    }
}

/// Result of one fixture execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureReport {
    /// Fixture identity
    pub id: FixtureId,
    /// Whether every check passed
    pub passed: bool,
    /// Checks evaluated
    pub checks_performed: u32,
    /// Checks that failed
    pub checks_failed: u32,
    /// Failures whose text did not fit in the fixture's log
    pub unrecorded_failures: u32,
    /// Execution duration
    pub duration: Duration,
}

/// Aggregate results of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Fixtures that matched the selection and ran
    pub fixtures_run: usize,
    /// Fixtures with at least one failed check
    pub fixtures_failed: usize,
    /// Checks evaluated across all fixtures
    pub checks_performed: u64,
    /// Checks failed across all fixtures
    pub checks_failed: u64,
    /// Total execution time
    pub duration: Duration,
    /// Per-fixture results, in execution order
    pub reports: Vec<FixtureReport>,
}

impl RunSummary {
    /// Returns true if no selected fixture failed.
    ///
    /// Also true when nothing was selected.
    pub fn all_passed(&self) -> bool {
        self.fixtures_failed == 0
    }

    /// Returns true if the selection matched no fixture.
    pub fn no_tests_found(&self) -> bool {
        self.fixtures_run == 0
    }

    /// Fold another summary into this one, e.g. from a second thread
    pub fn merge(&mut self, other: RunSummary) {
        self.fixtures_run += other.fixtures_run;
        self.fixtures_failed += other.fixtures_failed;
        self.checks_performed += other.checks_performed;
        self.checks_failed += other.checks_failed;
        self.duration = self.duration.max(other.duration);
        self.reports.extend(other.reports);
    }

    fn record(&mut self, report: FixtureReport) {
        self.fixtures_run += 1;
        if !report.passed {
            self.fixtures_failed += 1;
        }
        self.checks_performed += u64::from(report.checks_performed);
        self.checks_failed += u64::from(report.checks_failed);
        self.reports.push(report);
    }
}

/// Executes fixtures and reports through an [`Output`].
pub struct Runner<O: Output = StdoutOutput> {
    mode: OutputMode,
    output: O,
}

impl Default for Runner<StdoutOutput> {
    fn default() -> Self {
        Self::new(OutputMode::Normal, StdoutOutput::new())
    }
}

impl<O: Output> Runner<O> {
    /// Create a runner printing to `output`
    pub fn new(mode: OutputMode, output: O) -> Self {
        Self { mode, output }
    }

    /// The configured output mode
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// The output sink
    pub fn output(&self) -> &O {
        &self.output
    }

    /// The output sink, mutably
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Consume the runner and return its output sink
    pub fn into_output(self) -> O {
        self.output
    }

    /// Run every selected fixture, in iteration order, and report.
    pub fn run<'f, I>(&mut self, fixtures: I, selection: &Selection) -> RunSummary
    where
        I: IntoIterator<Item = &'f mut Fixture>,
    {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        for fixture in fixtures {
            if !selection.matches(fixture) {
                continue;
            }

            if self.mode == OutputMode::Verbose {
                self.output.print(&format!("Running [{}]", fixture.id()));
            }

            let fixture_start = Instant::now();
            let passed = fixture.execute_test();
            let report = FixtureReport {
                id: fixture.id().clone(),
                passed,
                checks_performed: fixture.checks_performed(),
                checks_failed: fixture.checks_failed(),
                unrecorded_failures: fixture.unrecorded_failures(),
                duration: fixture_start.elapsed(),
            };
            debug!(
                fixture = %report.id,
                passed,
                duration_ms = report.duration.as_secs_f64() * 1000.0,
                "fixture reported"
            );

            self.report_fixture(fixture, &report);
            summary.record(report);
        }

        summary.duration = start.elapsed();
        if summary.no_tests_found() {
            info!(%selection, "no tests found");
        }
        self.report_summary(&summary);
        summary
    }

    /// Run everything in `registry`
    pub fn run_all(&mut self, registry: &mut Registry) -> bool {
        self.run(registry, &Selection::all()).all_passed()
    }

    /// Run every fixture in `group`
    pub fn run_group(&mut self, registry: &mut Registry, group: &str) -> bool {
        self.run(registry, &Selection::group(group)).all_passed()
    }

    /// Run the fixture `group/name`
    pub fn run_one(&mut self, registry: &mut Registry, group: &str, name: &str) -> bool {
        self.run(registry, &Selection::one(group, name)).all_passed()
    }

    /// Run with optional group and name filters
    pub fn run_selected(
        &mut self,
        registry: &mut Registry,
        group: Option<&str>,
        name: Option<&str>,
    ) -> bool {
        self.run(registry, &Selection::from_filters(group, name)).all_passed()
    }

    fn report_fixture(&mut self, fixture: &Fixture, report: &FixtureReport) {
        if self.mode == OutputMode::Silent {
            return;
        }

        if report.passed {
            self.output.print_status(
                Status::Pass,
                &format!(
                    "[{}]: Passed {} out of {} tests",
                    fixture.name(),
                    report.checks_performed,
                    report.checks_performed
                ),
            );
            return;
        }

        self.output.print_status(
            Status::Fail,
            &format!(
                "[{}]: Failed {} out of {} tests",
                fixture.name(),
                report.checks_failed,
                report.checks_performed
            ),
        );
        for message in fixture.errors() {
            self.output.print_status(Status::Detail, message);
        }
        if report.unrecorded_failures > 0 {
            self.output.print_status(
                Status::Detail,
                &format!(
                    "... and {} more failure(s) not recorded",
                    report.unrecorded_failures
                ),
            );
        }
    }

    fn report_summary(&mut self, summary: &RunSummary) {
        if self.mode == OutputMode::Silent {
            return;
        }

        if summary.no_tests_found() {
            self.output.print("no tests found");
            return;
        }

        self.output.print(&format!(
            "{} fixtures run, {} checks performed, {} failed",
            summary.fixtures_run, summary.checks_performed, summary.checks_failed
        ));
        if summary.all_passed() {
            self.output.print_status(Status::Pass, "ALL PASSED");
        } else {
            self.output.print_status(
                Status::Fail,
                &format!(
                    "FAILED ({} of {} fixtures)",
                    summary.fixtures_failed, summary.fixtures_run
                ),
            );
        }
    }
}

/// Run every registered fixture, reporting to standard output.
pub fn run_all(registry: &mut Registry, mode: OutputMode) -> bool {
    Runner::new(mode, StdoutOutput::new()).run_all(registry)
}

/// Run every fixture in `group`, reporting to standard output.
pub fn run_group(registry: &mut Registry, group: &str, mode: OutputMode) -> bool {
    Runner::new(mode, StdoutOutput::new()).run_group(registry, group)
}

/// Run the fixture `group/name`, reporting to standard output.
pub fn run_one(registry: &mut Registry, group: &str, name: &str, mode: OutputMode) -> bool {
    Runner::new(mode, StdoutOutput::new()).run_one(registry, group, name)
}

/// Run with optional filters, reporting to standard output.
pub fn run_selected(
    registry: &mut Registry,
    group: Option<&str>,
    name: Option<&str>,
    mode: OutputMode,
) -> bool {
    Runner::new(mode, StdoutOutput::new()).run_selected(registry, group, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{TestCase, TestContext};
    use crate::output::BufferOutput;

    struct Case {
        name: &'static str,
        group: &'static str,
        passes: u32,
        failures: u32,
    }

    impl TestCase for Case {
        fn name(&self) -> &str {
            self.name
        }

        fn group(&self) -> &str {
            self.group
        }

        fn run(&mut self, ctx: &mut TestContext<'_>) {
            for _ in 0..self.passes {
                ctx.check(true);
            }
            for i in 0..self.failures {
                ctx.check_eq(i, i + 1);
            }
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        for (name, group, passes, failures) in
            [("A", "G1", 2, 0), ("B", "G1", 1, 1), ("C", "G2", 1, 0)]
        {
            registry
                .register(Case {
                    name,
                    group,
                    passes,
                    failures,
                })
                .unwrap();
        }
        registry
    }

    fn runner(mode: OutputMode) -> (Runner<BufferOutput>, BufferOutput) {
        let buffer = BufferOutput::new();
        (Runner::new(mode, buffer.clone()), buffer)
    }

    #[test]
    fn output_mode_parses_case_insensitively() {
        assert_eq!("silent".parse(), Ok(OutputMode::Silent));
        assert_eq!("NORMAL".parse(), Ok(OutputMode::Normal));
        assert_eq!("Verbose".parse(), Ok(OutputMode::Verbose));
        let err = "loud".parse::<OutputMode>().unwrap_err();
        assert!(err.to_string().contains("loud"));
        assert_eq!(OutputMode::default(), OutputMode::Normal);
        assert_eq!(OutputMode::Verbose.to_string(), "verbose");
    }

    #[test]
    fn selection_matching() {
        let id = FixtureId::new("G1", "A");
        assert!(Selection::all().matches_id(&id));
        assert!(Selection::group("G1").matches_id(&id));
        assert!(!Selection::group("g1").matches_id(&id));
        assert!(Selection::one("G1", "A").matches_id(&id));
        assert!(!Selection::one("G1", "B").matches_id(&id));
        assert!(Selection::all().with_name("A").matches_id(&id));
        assert_eq!(Selection::group("G1").to_string(), "group=G1 name=*");
    }

    #[test]
    fn group_selection_runs_only_that_group() {
        let mut registry = registry();
        let (mut runner, buffer) = runner(OutputMode::Normal);
        let summary = runner.run(&mut registry, &Selection::group("G1"));

        assert!(!summary.all_passed());
        assert_eq!(summary.fixtures_run, 2);
        assert_eq!(summary.checks_performed, 4);
        assert_eq!(summary.checks_failed, 1);
        assert_eq!(summary.fixtures_failed, 1);

        let output = buffer.contents();
        assert!(output.contains("[A]: Passed 2 out of 2 tests"));
        assert!(output.contains("[B]: Failed 1 out of 2 tests"));
        assert!(output.contains("Condition [0 == 1] Failed. 0 != 1"));
        assert!(!output.contains("[C]"));
        assert!(output.contains("2 fixtures run, 4 checks performed, 1 failed"));
        assert!(output.contains("FAILED (1 of 2 fixtures)"));
    }

    #[test]
    fn filtered_out_failures_do_not_affect_result() {
        let mut registry = registry();
        let (mut runner, _) = runner(OutputMode::Silent);
        assert!(runner.run_group(&mut registry, "G2"));
        assert!(runner.run_one(&mut registry, "G1", "A"));
        assert!(!runner.run_one(&mut registry, "G1", "B"));
        assert!(!runner.run_all(&mut registry));
    }

    #[test]
    fn no_match_reports_but_passes() {
        let mut registry = registry();
        let (mut runner, buffer) = runner(OutputMode::Normal);
        let summary = runner.run(&mut registry, &Selection::group("Missing"));
        assert!(summary.no_tests_found());
        assert!(summary.all_passed());
        assert_eq!(buffer.lines(), ["no tests found"]);
    }

    #[test]
    fn silent_mode_prints_nothing() {
        let mut registry = registry();
        let (mut runner, buffer) = runner(OutputMode::Silent);
        assert!(!runner.run_selected(&mut registry, None, None));
        assert!(buffer.lines().is_empty());

        assert!(runner.run_selected(&mut registry, Some("Missing"), None));
        assert!(buffer.lines().is_empty());
    }

    #[test]
    fn verbose_mode_announces_each_fixture() {
        let mut registry = registry();
        let (mut runner, buffer) = runner(OutputMode::Verbose);
        runner.run(&mut registry, &Selection::group("G2"));
        let lines = buffer.lines();
        assert_eq!(lines[0], "Running [G2/C]");
        assert_eq!(lines[1], "[C]: Passed 1 out of 1 tests");
        assert_eq!(lines.last().map(String::as_str), Some("ALL PASSED"));
    }

    #[test]
    fn normal_mode_does_not_announce() {
        let mut registry = registry();
        let (mut runner, buffer) = runner(OutputMode::Normal);
        runner.run(&mut registry, &Selection::all());
        assert!(buffer.lines().iter().all(|line| !line.starts_with("Running")));
    }

    #[test]
    fn each_fixture_runs_once_in_registration_order() {
        let mut registry = registry();
        let (mut runner, _) = runner(OutputMode::Silent);
        let summary = runner.run(&mut registry, &Selection::all());
        let order: Vec<_> = summary.reports.iter().map(|r| r.id.name()).collect();
        assert_eq!(order, ["A", "B", "C"]);
    }

    #[test]
    fn unrecorded_failures_are_reported() {
        let mut registry = Registry::new().with_message_space(128);
        registry
            .register(Case {
                name: "noisy",
                group: "G",
                passes: 0,
                failures: 50,
            })
            .unwrap();
        let (mut runner, buffer) = runner(OutputMode::Normal);
        let summary = runner.run(&mut registry, &Selection::all());
        assert_eq!(summary.checks_failed, 50);
        let report = &summary.reports[0];
        assert!(report.unrecorded_failures > 0);
        assert!(buffer.contents().contains(&format!(
            "... and {} more failure(s) not recorded",
            report.unrecorded_failures
        )));
    }

    #[test]
    fn summaries_merge() {
        let mut registry = registry();
        let (mut runner, _) = runner(OutputMode::Silent);
        let mut first = runner.run(&mut registry, &Selection::group("G1"));
        let second = runner.run(&mut registry, &Selection::group("G2"));
        first.merge(second);
        assert_eq!(first.fixtures_run, 3);
        assert_eq!(first.checks_performed, 5);
        assert_eq!(first.fixtures_failed, 1);
        assert_eq!(first.reports.len(), 3);
    }
}
