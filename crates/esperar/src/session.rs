//! Browser session abstraction.
//!
//! [`Session`] is the seam between the suite and the browser automation
//! driver. The suite depends only on the handful of operations it actually
//! performs: locator lookup (possibly empty), displayed/enabled probes,
//! click, keystrokes, hover, script execution, URL query, and screenshot
//! capture. The real backend lives in [`crate::webdriver`] behind the
//! `webdriver` feature; [`FakeSession`] drives flows in unit and
//! integration tests without a browser.

use crate::locator::Locator;
use crate::result::{Error, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Synchronous browser session commands.
///
/// Every method blocks until the driver answers. Implementations must
/// report an absent element as [`Error::ElementMissing`] from the per-element
/// operations, while [`Session::find`] reports absence as a zero count.
pub trait Session {
    /// Navigate to a URL
    fn goto(&self, url: &str) -> Result<()>;

    /// Number of elements currently matching the locator (0 when absent)
    fn find(&self, locator: &Locator) -> Result<usize>;

    /// Whether the first matching element is rendered with nonzero size
    fn is_displayed(&self, locator: &Locator) -> Result<bool>;

    /// Whether the first matching element accepts interaction
    fn is_enabled(&self, locator: &Locator) -> Result<bool>;

    /// Click the first matching element
    fn click(&self, locator: &Locator) -> Result<()>;

    /// Type text into the first matching element
    fn send_keys(&self, locator: &Locator, text: &str) -> Result<()>;

    /// Clear the text of the first matching element
    fn clear(&self, locator: &Locator) -> Result<()>;

    /// Move the pointer over the first matching element
    fn hover(&self, locator: &Locator) -> Result<()>;

    /// Text content of the first matching element
    fn element_text(&self, locator: &Locator) -> Result<String>;

    /// Execute JavaScript in the page and return its value
    fn execute_script(&self, script: &str) -> Result<serde_json::Value>;

    /// URL of the current page
    fn current_url(&self) -> Result<String>;

    /// PNG screenshot of the current page
    fn screenshot_png(&self) -> Result<Vec<u8>>;
}

/// Script used to reveal further list entries; recognized by the fake.
pub const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Script querying the document ready signal; recognized by the fake.
pub const READY_STATE_SCRIPT: &str = "return document.readyState";

/// One element record inside a [`FakeSession`]
#[derive(Debug, Clone)]
pub struct FakeElement {
    /// Whether the element is rendered with nonzero size
    pub displayed: bool,
    /// Whether the element accepts interaction
    pub enabled: bool,
    /// Text content
    pub text: String,
    /// Number of matches reported for the locator
    pub count: usize,
    /// The element does not exist before this instant
    pub appears_at: Option<Instant>,
}

impl Default for FakeElement {
    fn default() -> Self {
        Self {
            displayed: true,
            enabled: true,
            text: String::new(),
            count: 1,
            appears_at: None,
        }
    }
}

impl FakeElement {
    /// A visible, enabled element with the given text
    #[must_use]
    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// An element present in the DOM but not displayed
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            displayed: false,
            ..Self::default()
        }
    }

    /// A displayed element that rejects interaction
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Delay the element's appearance by `delay` from now
    #[must_use]
    pub fn appearing_after(mut self, delay: Duration) -> Self {
        self.appears_at = Some(Instant::now() + delay);
        self
    }

    fn exists(&self) -> bool {
        self.count > 0 && self.appears_at.map_or(true, |at| Instant::now() >= at)
    }
}

/// State change applied when the fake observes an interaction
#[derive(Debug, Clone)]
pub enum Effect {
    /// Make the target element present and displayed
    Reveal(Locator),
    /// Remove the target element from the DOM
    Remove(Locator),
    /// Change the current URL
    SetUrl(String),
    /// Replace the target element's text
    SetText(Locator, String),
}

#[derive(Debug, Default)]
struct FakeState {
    url: String,
    ready_state: String,
    ready_at: Option<Instant>,
    elements: HashMap<Locator, FakeElement>,
    on_click: HashMap<Locator, Vec<Effect>>,
    on_hover: HashMap<Locator, Vec<Effect>>,
    on_send_keys: HashMap<Locator, Vec<Effect>>,
    scroll_reveals: Vec<(usize, Locator)>,
    scroll_count: usize,
    typed: HashMap<Locator, String>,
    calls: Vec<String>,
    fail_finds: bool,
    fail_screenshots: bool,
}

impl FakeState {
    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Reveal(locator) => {
                    let element = self.elements.entry(locator).or_default();
                    element.displayed = true;
                    element.enabled = true;
                    element.count = element.count.max(1);
                    element.appears_at = None;
                }
                Effect::Remove(locator) => {
                    self.elements.remove(&locator);
                }
                Effect::SetUrl(url) => self.url = url,
                Effect::SetText(locator, text) => {
                    self.elements.entry(locator).or_default().text = text;
                }
            }
        }
    }

    fn existing(&self, locator: &Locator) -> Option<&FakeElement> {
        self.elements.get(locator).filter(|e| e.exists())
    }

    fn require(&self, locator: &Locator) -> Result<&FakeElement> {
        self.existing(locator).ok_or_else(|| Error::ElementMissing {
            locator: locator.clone(),
        })
    }

    fn current_ready_state(&self) -> &str {
        match self.ready_at {
            Some(at) if Instant::now() < at => "loading",
            _ => &self.ready_state,
        }
    }
}

/// Scriptable in-memory [`Session`] for tests.
///
/// Elements are keyed by locator; interactions record a call history and may
/// trigger [`Effect`]s, which is enough to script the asynchronous UI
/// behaviors the suite must tolerate (controls revealed by hover, rows
/// loaded by scrolling, banners appearing after a click).
#[derive(Debug, Default)]
pub struct FakeSession {
    state: Mutex<FakeState>,
}

impl FakeSession {
    /// Create an empty session on `about:blank` with a complete document
    #[must_use]
    pub fn new() -> Self {
        let session = Self::default();
        {
            let mut state = session.state();
            state.url = "about:blank".to_string();
            state.ready_state = "complete".to_string();
        }
        session
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake session state poisoned")
    }

    /// Insert or replace an element record
    pub fn insert(&self, locator: Locator, element: FakeElement) {
        let _ = self.state().elements.insert(locator, element);
    }

    /// Insert a visible, enabled element with the given text
    pub fn insert_visible(&self, locator: Locator, text: impl Into<String>) {
        self.insert(locator, FakeElement::visible(text));
    }

    /// Remove an element record
    pub fn remove(&self, locator: &Locator) {
        let _ = self.state().elements.remove(locator);
    }

    /// Override the document ready signal
    pub fn set_ready_state(&self, ready_state: impl Into<String>) {
        self.state().ready_state = ready_state.into();
    }

    /// Report `loading` until `delay` from now, then the configured state
    pub fn complete_after(&self, delay: Duration) {
        self.state().ready_at = Some(Instant::now() + delay);
    }

    /// Set the current URL
    pub fn set_url(&self, url: impl Into<String>) {
        self.state().url = url.into();
    }

    /// Register effects applied when the locator is clicked
    pub fn on_click(&self, locator: Locator, effects: Vec<Effect>) {
        let _ = self.state().on_click.insert(locator, effects);
    }

    /// Register effects applied when the locator is hovered
    pub fn on_hover(&self, locator: Locator, effects: Vec<Effect>) {
        let _ = self.state().on_hover.insert(locator, effects);
    }

    /// Register effects applied when keys are sent to the locator
    pub fn on_send_keys(&self, locator: Locator, effects: Vec<Effect>) {
        let _ = self.state().on_send_keys.insert(locator, effects);
    }

    /// Reveal `locator` once the page has been scrolled `after_scrolls` times
    pub fn reveal_on_scroll(&self, locator: Locator, after_scrolls: usize) {
        self.state().scroll_reveals.push((after_scrolls, locator));
    }

    /// Make every `find` fail with a session error (fault injection)
    pub fn fail_finds(&self, fail: bool) {
        self.state().fail_finds = fail;
    }

    /// Make screenshot capture fail (fault injection)
    pub fn fail_screenshots(&self, fail: bool) {
        self.state().fail_screenshots = fail;
    }

    /// Recorded call history, oldest first
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Whether any recorded call starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.state().calls.iter().any(|c| c.starts_with(prefix))
    }

    /// Number of recorded calls starting with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Text typed into the locator so far, if any
    #[must_use]
    pub fn typed_into(&self, locator: &Locator) -> Option<String> {
        self.state().typed.get(locator).cloned()
    }

    /// Number of scroll scripts executed
    #[must_use]
    pub fn scroll_count(&self) -> usize {
        self.state().scroll_count
    }
}

impl Session for FakeSession {
    fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("goto:{url}"));
        state.url = url.to_string();
        Ok(())
    }

    fn find(&self, locator: &Locator) -> Result<usize> {
        let mut state = self.state();
        state.calls.push(format!("find:{locator}"));
        if state.fail_finds {
            return Err(Error::Session {
                message: "injected find failure".to_string(),
            });
        }
        Ok(state.existing(locator).map_or(0, |e| e.count))
    }

    fn is_displayed(&self, locator: &Locator) -> Result<bool> {
        let state = self.state();
        state.require(locator).map(|e| e.displayed)
    }

    fn is_enabled(&self, locator: &Locator) -> Result<bool> {
        let state = self.state();
        state.require(locator).map(|e| e.enabled)
    }

    fn click(&self, locator: &Locator) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("click:{locator}"));
        state.require(locator)?;
        if let Some(effects) = state.on_click.get(locator).cloned() {
            state.apply(effects);
        }
        Ok(())
    }

    fn send_keys(&self, locator: &Locator, text: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("send_keys:{locator}"));
        state.require(locator)?;
        state
            .typed
            .entry(locator.clone())
            .or_default()
            .push_str(text);
        if let Some(effects) = state.on_send_keys.get(locator).cloned() {
            state.apply(effects);
        }
        Ok(())
    }

    fn clear(&self, locator: &Locator) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("clear:{locator}"));
        state.require(locator)?;
        let _ = state.typed.insert(locator.clone(), String::new());
        Ok(())
    }

    fn hover(&self, locator: &Locator) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("hover:{locator}"));
        state.require(locator)?;
        if let Some(effects) = state.on_hover.get(locator).cloned() {
            state.apply(effects);
        }
        Ok(())
    }

    fn element_text(&self, locator: &Locator) -> Result<String> {
        let state = self.state();
        state.require(locator).map(|e| e.text.clone())
    }

    fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        let mut state = self.state();
        state.calls.push(format!("script:{script}"));
        if script.contains("readyState") {
            return Ok(serde_json::Value::String(
                state.current_ready_state().to_string(),
            ));
        }
        if script.contains("scrollTo") {
            state.scroll_count += 1;
            let due: Vec<Locator> = state
                .scroll_reveals
                .iter()
                .filter(|(after, _)| state.scroll_count >= *after)
                .map(|(_, locator)| locator.clone())
                .collect();
            state.apply(due.into_iter().map(Effect::Reveal).collect());
        }
        Ok(serde_json::Value::Null)
    }

    fn current_url(&self) -> Result<String> {
        Ok(self.state().url.clone())
    }

    fn screenshot_png(&self) -> Result<Vec<u8>> {
        let state = self.state();
        if state.fail_screenshots {
            return Err(Error::Screenshot {
                message: "injected screenshot failure".to_string(),
            });
        }
        // PNG magic bytes are enough for callers that only persist the data.
        Ok(vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
    }
}
