//! Wait mechanisms for synchronizing with the asynchronous UI.
//!
//! The page renders asynchronously and is externally mutable, so nothing is
//! cached: every probe reads live state through the session. [`wait_until`]
//! is the polling primitive; [`Waits`] builds the named element conditions
//! on top of it. Every bounded wait resolves to exactly one of success,
//! [`Error::Timeout`], or a propagated probe error; there is no silent
//! null result.

use crate::evidence::RunDir;
use crate::locator::Locator;
use crate::result::{Error, Result};
use crate::session::{Session, READY_STATE_SCRIPT};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Default timeout for element waits (20 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

/// Default timeout for the page-load wait (30 seconds)
pub const PAGE_LOAD_TIMEOUT_MS: u64 = 30_000;

/// Default timeout for the URL-change wait (10 seconds)
pub const URL_CHANGE_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Timeout and polling interval for one wait call
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as a `Duration`
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Metadata for a wait that succeeded
#[derive(Debug, Clone)]
pub struct WaitOutcome {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was awaited
    pub waited_for: String,
}

/// Poll `probe` until it returns `Ok(true)` or `options.timeout` elapses.
///
/// Returns immediately on the first true probe, with no trailing sleep. A
/// final probe is made after the deadline, so a condition that became true
/// at exactly the timeout is still observed; the timeout error is therefore
/// raised no earlier than T and no later than T plus one poll interval.
///
/// A probe returning `Err` aborts the wait and propagates: DOM-read
/// failures are not retried away. Callers that must never raise (element
/// existence checks) convert errors to `false` before reaching here.
pub fn wait_until<F>(mut probe: F, options: &WaitOptions, waited_for: &str) -> Result<WaitOutcome>
where
    F: FnMut() -> Result<bool>,
{
    let start = Instant::now();
    let timeout = options.timeout();
    loop {
        if probe()? {
            return Ok(WaitOutcome {
                elapsed: start.elapsed(),
                waited_for: waited_for.to_string(),
            });
        }
        if start.elapsed() >= timeout {
            return Err(Error::Timeout {
                waited_for: waited_for.to_string(),
                timeout_ms: options.timeout_ms,
                elapsed_ms: start.elapsed().as_millis() as u64,
            });
        }
        std::thread::sleep(options.poll_interval());
    }
}

/// Whether any element currently matches the locator.
///
/// Never raises, regardless of DOM or session state: lookup errors and zero
/// matches both report `false`.
pub fn is_element_present<S: Session>(session: &S, locator: &Locator) -> bool {
    session.find(locator).map(|count| count > 0).unwrap_or(false)
}

fn displayed_probe<S: Session>(session: &S, locator: &Locator) -> Result<bool> {
    if session.find(locator)? == 0 {
        return Ok(false);
    }
    match session.is_displayed(locator) {
        Ok(displayed) => Ok(displayed),
        // The element vanished between the lookup and the probe; keep polling.
        Err(Error::ElementMissing { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}

fn clickable_probe<S: Session>(session: &S, locator: &Locator) -> Result<bool> {
    if !displayed_probe(session, locator)? {
        return Ok(false);
    }
    match session.is_enabled(locator) {
        Ok(enabled) => Ok(enabled),
        Err(Error::ElementMissing { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Named element waits over one session.
///
/// Construct one per test step; attach a [`RunDir`] to capture evidence
/// when a clickability wait fails.
pub struct Waits<'a, S: Session> {
    session: &'a S,
    evidence: Option<&'a RunDir>,
}

impl<S: Session> std::fmt::Debug for Waits<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waits")
            .field("evidence", &self.evidence.map(RunDir::path))
            .finish_non_exhaustive()
    }
}

impl<'a, S: Session> Waits<'a, S> {
    /// Create waits over a session, without evidence capture
    #[must_use]
    pub fn new(session: &'a S) -> Self {
        Self {
            session,
            evidence: None,
        }
    }

    /// Capture failure screenshots into `run_dir`
    #[must_use]
    pub fn with_evidence(mut self, run_dir: &'a RunDir) -> Self {
        self.evidence = Some(run_dir);
        self
    }

    /// Wait for `document.readyState` to report `complete`.
    pub fn page_loaded(&self, options: &WaitOptions) -> Result<WaitOutcome> {
        let result = wait_until(
            || {
                let value = self.session.execute_script(READY_STATE_SCRIPT)?;
                Ok(value.as_str() == Some("complete"))
            },
            options,
            "document.readyState == \"complete\"",
        );
        match &result {
            Ok(outcome) => {
                info!(elapsed_ms = outcome.elapsed.as_millis() as u64, "page loaded completely");
            }
            Err(err) => {
                error!(timeout_ms = options.timeout_ms, %err, "page did not load completely");
            }
        }
        result
    }

    /// Wait for the element to be present and rendered with nonzero size.
    pub fn visible(&self, locator: &Locator, options: &WaitOptions) -> Result<WaitOutcome> {
        let result = wait_until(
            || displayed_probe(self.session, locator),
            options,
            &format!("visible: {locator}"),
        );
        match &result {
            Ok(outcome) => info!(
                %locator,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "element is now visible"
            ),
            Err(err) => error!(%locator, timeout_ms = options.timeout_ms, %err, "element did not become visible"),
        }
        result
    }

    /// Wait for the element to be visible and accepting interaction.
    ///
    /// Internally waits for the page to load first, so the layout is stable
    /// before clickability is probed. On failure a screenshot keyed by the
    /// locator is captured (when evidence is attached), then the error is
    /// re-raised.
    pub fn visible_and_clickable(
        &self,
        locator: &Locator,
        options: &WaitOptions,
    ) -> Result<WaitOutcome> {
        let result = self.page_loaded(options).and_then(|_| {
            wait_until(
                || clickable_probe(self.session, locator),
                options,
                &format!("visible and clickable: {locator}"),
            )
        });
        match &result {
            Ok(outcome) => info!(
                %locator,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "element is visible and clickable"
            ),
            Err(err) => {
                error!(%locator, timeout_ms = options.timeout_ms, %err, "element did not become clickable");
                if let Some(run_dir) = self.evidence {
                    let _ = run_dir.capture_element_failure(self.session, locator);
                }
            }
        }
        result
    }

    /// Wait for the current URL to differ from `original_url`.
    ///
    /// Confirms a navigation actually occurred, not just that a click fired.
    pub fn url_changed(&self, original_url: &str, options: &WaitOptions) -> Result<WaitOutcome> {
        let result = wait_until(
            || Ok(self.session.current_url()? != original_url),
            options,
            &format!("URL change from {original_url}"),
        );
        match &result {
            Ok(_) => info!(from = original_url, "URL has changed from the original URL"),
            Err(err) => error!(from = original_url, %err, "timed out waiting for URL to change"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{FakeElement, FakeSession};
    use std::cell::Cell;

    fn fast(timeout_ms: u64) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(timeout_ms)
            .with_poll_interval(10)
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = WaitOptions::default();
            assert_eq!(options.timeout_ms, DEFAULT_TIMEOUT_MS);
            assert_eq!(options.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_builders_and_durations() {
            let options = WaitOptions::new().with_timeout(5000).with_poll_interval(100);
            assert_eq!(options.timeout(), Duration::from_millis(5000));
            assert_eq!(options.poll_interval(), Duration::from_millis(100));
        }
    }

    mod wait_until_tests {
        use super::*;

        #[test]
        fn test_immediate_success_probes_once_without_sleep() {
            let probes = Cell::new(0u32);
            let start = Instant::now();
            let outcome = wait_until(
                || {
                    probes.set(probes.get() + 1);
                    Ok(true)
                },
                &fast(1000),
                "already true",
            )
            .unwrap();
            assert_eq!(probes.get(), 1);
            assert_eq!(outcome.waited_for, "already true");
            // No poll sleep on the success path.
            assert!(start.elapsed() < Duration::from_millis(50));
        }

        #[test]
        fn test_condition_becoming_true_is_detected() {
            let probes = Cell::new(0u32);
            let outcome = wait_until(
                || {
                    probes.set(probes.get() + 1);
                    Ok(probes.get() >= 3)
                },
                &fast(1000),
                "true on third probe",
            )
            .unwrap();
            assert_eq!(probes.get(), 3);
            assert!(outcome.elapsed >= Duration::from_millis(20));
        }

        #[test]
        fn test_permanently_false_times_out_no_earlier_than_limit() {
            let result = wait_until(|| Ok(false), &fast(80), "never true");
            match result {
                Err(Error::Timeout {
                    waited_for,
                    timeout_ms,
                    elapsed_ms,
                }) => {
                    assert_eq!(waited_for, "never true");
                    assert_eq!(timeout_ms, 80);
                    assert!(elapsed_ms >= 80);
                }
                other => panic!("expected timeout, got {other:?}"),
            }
        }

        #[test]
        fn test_final_probe_after_deadline_still_observes_success() {
            // Becomes true exactly at the deadline; the closing probe must
            // see it rather than racing the timeout check.
            let start = Instant::now();
            let result = wait_until(
                || Ok(start.elapsed() >= Duration::from_millis(80)),
                &fast(80),
                "true at deadline",
            );
            assert!(result.is_ok());
        }

        #[test]
        fn test_probe_error_propagates_immediately() {
            let probes = Cell::new(0u32);
            let result = wait_until(
                || {
                    probes.set(probes.get() + 1);
                    Err(Error::Session {
                        message: "lost connection".to_string(),
                    })
                },
                &fast(1000),
                "erroring probe",
            );
            assert_eq!(probes.get(), 1);
            assert!(matches!(result, Err(Error::Session { .. })));
        }
    }

    mod presence_tests {
        use super::*;

        #[test]
        fn test_is_element_present_zero_matches_is_false() {
            let session = FakeSession::new();
            assert!(!is_element_present(&session, &Locator::css("#missing")));
        }

        #[test]
        fn test_is_element_present_with_match_is_true() {
            let session = FakeSession::new();
            let locator = Locator::class_name("GlobalLibraryTitle");
            session.insert_visible(locator.clone(), "Library");
            assert!(is_element_present(&session, &locator));
        }

        #[test]
        fn test_is_element_present_never_raises() {
            let session = FakeSession::new();
            session.fail_finds(true);
            assert!(!is_element_present(&session, &Locator::css("#any")));
        }
    }

    mod element_wait_tests {
        use super::*;

        #[test]
        fn test_page_loaded_waits_for_complete() {
            let session = FakeSession::new();
            session.complete_after(Duration::from_millis(30));
            let waits = Waits::new(&session);
            let outcome = waits.page_loaded(&fast(500)).unwrap();
            assert!(outcome.elapsed >= Duration::from_millis(20));
        }

        #[test]
        fn test_page_loaded_timeout_propagates() {
            let session = FakeSession::new();
            session.set_ready_state("interactive");
            let waits = Waits::new(&session);
            assert!(waits.page_loaded(&fast(60)).unwrap_err().is_timeout());
        }

        #[test]
        fn test_visible_detects_delayed_element() {
            let session = FakeSession::new();
            let banner = Locator::class_name("WelcomeMsgName");
            session.insert(
                banner.clone(),
                FakeElement::visible("Hello Player").appearing_after(Duration::from_millis(30)),
            );
            let waits = Waits::new(&session);
            assert!(waits.visible(&banner, &fast(500)).is_ok());
        }

        #[test]
        fn test_visible_times_out_on_hidden_element() {
            let session = FakeSession::new();
            let banner = Locator::class_name("WelcomeMsgName");
            session.insert(banner.clone(), FakeElement::hidden());
            let waits = Waits::new(&session);
            assert!(waits.visible(&banner, &fast(60)).unwrap_err().is_timeout());
        }

        #[test]
        fn test_clickable_rejects_disabled_element() {
            let session = FakeSession::new();
            let join = Locator::class_name("LobbyJoinButton");
            session.insert(join.clone(), FakeElement::disabled());
            let waits = Waits::new(&session);
            assert!(waits
                .visible_and_clickable(&join, &fast(60))
                .unwrap_err()
                .is_timeout());
        }

        #[test]
        fn test_clickable_captures_evidence_on_failure() {
            let tmp = tempfile::tempdir().unwrap();
            let run_dir = RunDir::create(tmp.path()).unwrap();
            let session = FakeSession::new();
            let join = Locator::class_name("LobbyJoinButton");
            let waits = Waits::new(&session).with_evidence(&run_dir);

            assert!(waits.visible_and_clickable(&join, &fast(60)).is_err());
            let screenshot = run_dir
                .path()
                .join("screenshots")
                .join("element_not_found_LobbyJoinButton.png");
            assert!(screenshot.exists());
        }

        #[test]
        fn test_clickable_success_captures_nothing() {
            let tmp = tempfile::tempdir().unwrap();
            let run_dir = RunDir::create(tmp.path()).unwrap();
            let session = FakeSession::new();
            let join = Locator::class_name("LobbyJoinButton");
            session.insert_visible(join.clone(), "Join");
            let waits = Waits::new(&session).with_evidence(&run_dir);

            assert!(waits.visible_and_clickable(&join, &fast(500)).is_ok());
            assert!(!run_dir.path().join("screenshots").exists());
        }

        #[test]
        fn test_url_changed_observes_concurrent_navigation() {
            let session = FakeSession::new();
            session.set_url("https://lobby.example/login");
            std::thread::scope(|scope| {
                scope.spawn(|| {
                    std::thread::sleep(Duration::from_millis(30));
                    session.set_url("https://lobby.example/home");
                });
                let waits = Waits::new(&session);
                assert!(waits
                    .url_changed("https://lobby.example/login", &fast(500))
                    .is_ok());
            });
        }

        #[test]
        fn test_url_changed_timeout_when_static() {
            let session = FakeSession::new();
            session.set_url("https://lobby.example/login");
            let waits = Waits::new(&session);
            assert!(waits
                .url_changed("https://lobby.example/login", &fast(60))
                .unwrap_err()
                .is_timeout());
        }
    }
}
