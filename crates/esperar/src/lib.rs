//! esperar: browser UI test suite for the game lobby product.
//!
//! Drives a real browser to log a player in, locate an event in the Global
//! Library or the Lobby listing, join it, and assert on the resulting UI
//! state. The crate is built around four pieces:
//!
//! - a polling condition primitive ([`wait::wait_until`]),
//! - named element waits over a session ([`wait::Waits`]),
//! - a navigation state machine that re-probes live UI state at every
//!   decision point ([`navigation::EventNavigator`]),
//! - evidence capture keyed by test name or locator ([`evidence::RunDir`]).
//!
//! The browser is behind the [`session::Session`] seam: tests run against
//! the scriptable [`session::FakeSession`], the `webdriver` feature adds a
//! real backend over a chromedriver/Selenium endpoint.
//!
//! Everything is synchronous and single-threaded: one control thread, one
//! session, every wait blocks until condition-true or timeout.

#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod evidence;
pub mod flow;
pub mod locator;
pub mod logging;
pub mod navigation;
pub mod result;
pub mod session;
pub mod wait;

#[cfg(feature = "webdriver")]
pub mod webdriver;

pub use config::{Credentials, FailureMode, SuiteConfig};
pub use context::{RunContext, SuiteSummary, TestReport};
pub use evidence::{RunDir, TestOutcome};
pub use locator::{Locator, Strategy};
pub use navigation::{
    probe_ui_state, EventNavigator, NavigationOutcome, NavigatorConfig, UiState,
};
pub use result::{Error, Result};
pub use session::{Effect, FakeElement, FakeSession, Session};
pub use wait::{is_element_present, wait_until, WaitOptions, WaitOutcome, Waits};

#[cfg(feature = "webdriver")]
pub use webdriver::WebDriverSession;

/// Common imports for writing suites
pub mod prelude {
    pub use crate::config::{Credentials, FailureMode, SuiteConfig};
    pub use crate::context::RunContext;
    pub use crate::evidence::{RunDir, TestOutcome};
    pub use crate::locator::{Locator, Strategy};
    pub use crate::navigation::{EventNavigator, NavigationOutcome, NavigatorConfig, UiState};
    pub use crate::result::{Error, Result};
    pub use crate::session::{FakeSession, Session};
    pub use crate::wait::{is_element_present, WaitOptions, Waits};

    #[cfg(feature = "webdriver")]
    pub use crate::webdriver::WebDriverSession;
}
