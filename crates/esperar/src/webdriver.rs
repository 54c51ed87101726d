//! Real browser sessions over a WebDriver endpoint.
//!
//! Adapter from [`Session`] onto the synchronous `thirtyfour_sync` client.
//! Requires a running chromedriver or Selenium server; the browser session
//! is closed when the driver handle drops, so the run context's lifecycle
//! guarantees hold without extra plumbing.

use crate::locator::{Locator, Strategy};
use crate::result::{Error, Result};
use crate::session::Session;
use thirtyfour_sync::prelude::*;

/// A live browser session driven over the WebDriver protocol
pub struct WebDriverSession {
    driver: WebDriver,
}

impl std::fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverSession").finish_non_exhaustive()
    }
}

fn wrap(err: thirtyfour_sync::error::WebDriverError) -> Error {
    Error::Session {
        message: err.to_string(),
    }
}

impl WebDriverSession {
    /// Open a Chrome session against `server_url` and maximize the window
    pub fn connect(server_url: &str) -> Result<Self> {
        let caps = DesiredCapabilities::chrome();
        let driver = WebDriver::new(server_url, &caps).map_err(wrap)?;
        driver.maximize_window().map_err(wrap)?;
        Ok(Self { driver })
    }

    /// End the browser session explicitly
    pub fn quit(self) -> Result<()> {
        self.driver.quit().map_err(wrap)
    }

    fn by(locator: &Locator) -> By<'_> {
        match locator.strategy {
            Strategy::Css => By::Css(&locator.value),
            Strategy::XPath => By::XPath(&locator.value),
            Strategy::Name => By::Name(&locator.value),
            Strategy::ClassName => By::ClassName(&locator.value),
        }
    }

    fn first(&self, locator: &Locator) -> Result<WebElement<'_>> {
        let mut found = self
            .driver
            .find_elements(Self::by(locator))
            .map_err(wrap)?;
        if found.is_empty() {
            return Err(Error::ElementMissing {
                locator: locator.clone(),
            });
        }
        Ok(found.remove(0))
    }
}

impl Session for WebDriverSession {
    fn goto(&self, url: &str) -> Result<()> {
        self.driver.get(url).map_err(wrap)
    }

    fn find(&self, locator: &Locator) -> Result<usize> {
        self.driver
            .find_elements(Self::by(locator))
            .map(|elements| elements.len())
            .map_err(wrap)
    }

    fn is_displayed(&self, locator: &Locator) -> Result<bool> {
        self.first(locator)?.is_displayed().map_err(wrap)
    }

    fn is_enabled(&self, locator: &Locator) -> Result<bool> {
        self.first(locator)?.is_enabled().map_err(wrap)
    }

    fn click(&self, locator: &Locator) -> Result<()> {
        self.first(locator)?.click().map_err(wrap)
    }

    fn send_keys(&self, locator: &Locator, text: &str) -> Result<()> {
        self.first(locator)?.send_keys(text).map_err(wrap)
    }

    fn clear(&self, locator: &Locator) -> Result<()> {
        self.first(locator)?.clear().map_err(wrap)
    }

    fn hover(&self, locator: &Locator) -> Result<()> {
        let element = self.first(locator)?;
        self.driver
            .action_chain()
            .move_to_element_center(&element)
            .perform()
            .map_err(wrap)
    }

    fn element_text(&self, locator: &Locator) -> Result<String> {
        self.first(locator)?.text().map_err(wrap)
    }

    fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        self.driver
            .execute_script(script)
            .map(|ret| ret.value().clone())
            .map_err(wrap)
    }

    fn current_url(&self) -> Result<String> {
        self.driver.current_url().map_err(wrap)
    }

    fn screenshot_png(&self) -> Result<Vec<u8>> {
        self.driver
            .screenshot_as_png()
            .map_err(|err| Error::Screenshot {
                message: err.to_string(),
            })
    }
}
