//! Run context: one session, one run directory, one suite verdict.
//!
//! The browser session is a shared, mutable external resource with exactly
//! one owner. [`RunContext`] makes that ownership explicit: it holds the
//! handle for the duration of a run, passes it into each test body, and
//! releases it (the driver quits on drop) when the context is consumed at
//! run end. There is no global session.

use crate::config::{FailureMode, SuiteConfig};
use crate::evidence::{RunDir, TestOutcome};
use crate::result::{Error, Result};
use crate::session::Session;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Result of running a single test
#[derive(Debug, Clone)]
pub struct TestReport {
    /// Test name
    pub name: String,
    /// Whether the test passed (soft-failed tests pass with `error` set)
    pub passed: bool,
    /// Error recorded for the test, if any
    pub error: Option<String>,
    /// Test duration
    pub duration: Duration,
}

impl TestReport {
    fn new(name: &str, passed: bool, error: Option<String>, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            passed,
            error,
            duration,
        }
    }
}

/// Aggregated results of a suite run
#[derive(Debug, Clone)]
pub struct SuiteSummary {
    /// Suite name
    pub suite_name: String,
    /// Individual test reports, in execution order
    pub reports: Vec<TestReport>,
    /// Total duration
    pub duration: Duration,
}

impl SuiteSummary {
    /// Whether every test passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(|r| r.passed)
    }

    /// Number of passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.passed).count()
    }

    /// Number of failed tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.reports.iter().filter(|r| !r.passed).count()
    }

    /// Failed test reports
    #[must_use]
    pub fn failures(&self) -> Vec<&TestReport> {
        self.reports.iter().filter(|r| !r.passed).collect()
    }
}

/// Owns one browser session and one run directory for a suite run
pub struct RunContext<S: Session> {
    config: SuiteConfig,
    session: S,
    run_dir: RunDir,
    reports: Vec<TestReport>,
    started: Instant,
}

impl<S: Session> std::fmt::Debug for RunContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("suite_name", &self.config.suite_name)
            .field("run_dir", &self.run_dir.path())
            .field("tests_run", &self.reports.len())
            .finish_non_exhaustive()
    }
}

impl<S: Session> RunContext<S> {
    /// Acquire a context: creates the run directory, takes the session
    pub fn new(config: SuiteConfig, session: S) -> Result<Self> {
        let run_dir = RunDir::create(&config.logs_root)?;
        info!(
            suite = %config.suite_name,
            run_dir = %run_dir.path().display(),
            "suite run started"
        );
        Ok(Self {
            config,
            session,
            run_dir,
            reports: Vec::new(),
            started: Instant::now(),
        })
    }

    /// The session handle
    #[must_use]
    pub fn session(&self) -> &S {
        &self.session
    }

    /// The run directory
    #[must_use]
    pub fn run_dir(&self) -> &RunDir {
        &self.run_dir
    }

    /// The suite configuration
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run one test body under the suite failure policy.
    ///
    /// Assertion failures always fail the test. Any other error is logged
    /// and screenshotted; under [`FailureMode::ContinueAndLog`] the test
    /// still passes (with the error recorded), under
    /// [`FailureMode::FailFast`] it fails. A success/error screenshot is
    /// written either way.
    pub fn run_test<F>(&mut self, name: &str, test: F) -> &TestReport
    where
        F: FnOnce(&S, &RunDir, &SuiteConfig) -> Result<()>,
    {
        info!(test = name, "starting test");
        let start = Instant::now();
        let result = test(&self.session, &self.run_dir, &self.config);
        let duration = start.elapsed();

        let report = match result {
            Ok(()) => {
                let _ = self
                    .run_dir
                    .capture(&self.session, name, TestOutcome::Success);
                info!(test = name, elapsed_ms = duration.as_millis() as u64, "test passed");
                TestReport::new(name, true, None, duration)
            }
            Err(err @ Error::Assertion { .. }) => {
                error!(test = name, %err, "assertion failed");
                let _ = self
                    .run_dir
                    .capture(&self.session, name, TestOutcome::Error);
                TestReport::new(name, false, Some(err.to_string()), duration)
            }
            Err(err) => {
                error!(test = name, %err, "an error occurred");
                let _ = self
                    .run_dir
                    .capture(&self.session, name, TestOutcome::Error);
                match self.config.failure_mode {
                    FailureMode::FailFast => {
                        TestReport::new(name, false, Some(err.to_string()), duration)
                    }
                    FailureMode::ContinueAndLog => {
                        warn!(test = name, "continuing despite interaction error");
                        TestReport::new(name, true, Some(err.to_string()), duration)
                    }
                }
            }
        };

        info!(test = name, "finished test");
        self.reports.push(report);
        self.reports.last().expect("report just pushed")
    }

    /// Finish the run: drops the session (quitting the driver) and returns
    /// the aggregated summary.
    #[must_use]
    pub fn finish(self) -> SuiteSummary {
        let summary = SuiteSummary {
            suite_name: self.config.suite_name.clone(),
            reports: self.reports,
            duration: self.started.elapsed(),
        };
        info!(
            suite = %summary.suite_name,
            passed = summary.passed_count(),
            failed = summary.failed_count(),
            "suite run completed"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FakeSession;

    fn context(failure_mode: FailureMode) -> (tempfile::TempDir, RunContext<FakeSession>) {
        let tmp = tempfile::tempdir().unwrap();
        let config = SuiteConfig {
            logs_root: tmp.path().to_path_buf(),
            failure_mode,
            ..SuiteConfig::default()
        };
        let ctx = RunContext::new(config, FakeSession::new()).unwrap();
        (tmp, ctx)
    }

    #[test]
    fn test_passing_test_writes_success_screenshot() {
        let (_tmp, mut ctx) = context(FailureMode::ContinueAndLog);
        let report = ctx.run_test("login", |_, _, _| Ok(()));
        assert!(report.passed);
        assert!(report.error.is_none());
        let path = ctx.run_dir().screenshot_path("login", TestOutcome::Success);
        assert!(path.exists());
    }

    #[test]
    fn test_assertion_always_fails_the_test() {
        let (_tmp, mut ctx) = context(FailureMode::ContinueAndLog);
        let report = ctx.run_test("welcome", |_, _, _| {
            Err(Error::Assertion {
                message: "welcome text missing".to_string(),
            })
        });
        assert!(!report.passed);
        assert!(report.error.as_deref().unwrap().contains("welcome text"));
        let path = ctx.run_dir().screenshot_path("welcome", TestOutcome::Error);
        assert!(path.exists());
    }

    #[test]
    fn test_interaction_error_soft_fails_by_default() {
        let (_tmp, mut ctx) = context(FailureMode::ContinueAndLog);
        let report = ctx.run_test("join", |_, _, _| {
            Err(Error::Timeout {
                waited_for: "join button".to_string(),
                timeout_ms: 10,
                elapsed_ms: 12,
            })
        });
        // Recorded, screenshotted, but not gating.
        assert!(report.passed);
        assert!(report.error.is_some());
        let path = ctx.run_dir().screenshot_path("join", TestOutcome::Error);
        assert!(path.exists());
    }

    #[test]
    fn test_interaction_error_gates_under_fail_fast() {
        let (_tmp, mut ctx) = context(FailureMode::FailFast);
        let report = ctx.run_test("join", |_, _, _| {
            Err(Error::Session {
                message: "lost connection".to_string(),
            })
        });
        assert!(!report.passed);
    }

    #[test]
    fn test_summary_aggregation() {
        let (_tmp, mut ctx) = context(FailureMode::ContinueAndLog);
        let _ = ctx.run_test("first", |_, _, _| Ok(()));
        let _ = ctx.run_test("second", |_, _, _| {
            Err(Error::Assertion {
                message: "boom".to_string(),
            })
        });
        let summary = ctx.finish();
        assert_eq!(summary.passed_count(), 1);
        assert_eq!(summary.failed_count(), 1);
        assert!(!summary.all_passed());
        assert_eq!(summary.failures()[0].name, "second");
    }
}
