//! Result and error types for esperar.

use crate::locator::Locator;
use thiserror::Error;

/// Result type for suite operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the browser UI
#[derive(Debug, Error)]
pub enum Error {
    /// A bounded wait did not observe its condition
    #[error("timed out after {elapsed_ms}ms (limit {timeout_ms}ms) waiting for {waited_for}")]
    Timeout {
        /// Description of the awaited condition
        waited_for: String,
        /// Configured timeout in milliseconds
        timeout_ms: u64,
        /// Time actually spent waiting, in milliseconds
        elapsed_ms: u64,
    },

    /// The queried element is absent from the DOM entirely
    ///
    /// Distinct from "present but not yet visible", which is a [`Error::Timeout`].
    #[error("no element matches {locator}")]
    ElementMissing {
        /// Locator that matched nothing
        locator: Locator,
    },

    /// An explicit postcondition was violated; always fatal to the test
    #[error("assertion failed: {message}")]
    Assertion {
        /// What was expected and what was observed
        message: String,
    },

    /// The browser session rejected or failed a command
    #[error("session error: {message}")]
    Session {
        /// Error message from the driver
        message: String,
    },

    /// Screenshot capture failed
    #[error("screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Suite configuration could not be loaded or is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is an explicit assertion failure.
    ///
    /// Assertions gate the suite regardless of the configured failure mode.
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion { .. })
    }

    /// Whether this error is a wait timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
