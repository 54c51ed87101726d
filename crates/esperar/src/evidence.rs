//! Evidence capture: per-run directories and diagnosis screenshots.
//!
//! Every suite run gets a timestamped directory under the logs root.
//! Screenshots are keyed either by test name and outcome
//! (`<test>_<outcome>.png`) or, for element lookup failures, by locator
//! (`screenshots/element_not_found_<key>.png`). Capture is diagnostic side
//! output: failures are logged and swallowed, never fatal to the test.

use crate::locator::Locator;
use crate::result::Result;
use crate::session::Session;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

const SCREENSHOTS_SUBDIR: &str = "screenshots";

/// Outcome of a test, used to key evidence file names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    /// The test completed and its assertions held
    Success,
    /// The test failed or aborted
    Error,
}

impl TestOutcome {
    /// File-name token for this outcome
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Timestamped directory holding one run's screenshots
#[derive(Debug, Clone)]
pub struct RunDir {
    root: PathBuf,
}

impl RunDir {
    /// Create `<logs_root>/test_run_<timestamp>/`
    pub fn create(logs_root: &Path) -> Result<Self> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let root = logs_root.join(format!("test_run_{stamp}"));
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The run directory path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path a test/outcome screenshot would be written to
    #[must_use]
    pub fn screenshot_path(&self, test_name: &str, outcome: TestOutcome) -> PathBuf {
        self.root.join(format!("{test_name}_{outcome}.png"))
    }

    /// Capture a screenshot keyed by test name and outcome.
    ///
    /// Returns the written path, or `None` if capture failed (logged).
    pub fn capture<S: Session>(
        &self,
        session: &S,
        test_name: &str,
        outcome: TestOutcome,
    ) -> Option<PathBuf> {
        self.write_screenshot(session, self.screenshot_path(test_name, outcome))
    }

    /// Capture a screenshot keyed by the locator that failed to resolve.
    pub fn capture_element_failure<S: Session>(
        &self,
        session: &S,
        locator: &Locator,
    ) -> Option<PathBuf> {
        let dir = self.root.join(SCREENSHOTS_SUBDIR);
        if let Err(err) = fs::create_dir_all(&dir) {
            error!(%err, "could not create screenshots directory");
            return None;
        }
        let path = dir.join(format!("element_not_found_{}.png", locator.file_key()));
        self.write_screenshot(session, path)
    }

    fn write_screenshot<S: Session>(&self, session: &S, path: PathBuf) -> Option<PathBuf> {
        let png = match session.screenshot_png() {
            Ok(png) => png,
            Err(err) => {
                error!(%err, "failed to capture screenshot");
                return None;
            }
        };
        match fs::write(&path, png) {
            Ok(()) => {
                info!(path = %path.display(), "screenshot saved");
                Some(path)
            }
            Err(err) => {
                error!(%err, path = %path.display(), "failed to write screenshot");
                None
            }
        }
    }
}
