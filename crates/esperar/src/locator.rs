//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an immutable strategy + value pair identifying a UI
//! element. Locators are constructed fresh per lookup and carry no session
//! state, so they can be freely cloned, hashed, and embedded in errors.

/// Lookup strategy for a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// CSS selector (e.g. `button.primary`)
    Css,
    /// XPath expression (structural path)
    XPath,
    /// `name` attribute match
    Name,
    /// Single class name match
    ClassName,
}

impl Strategy {
    /// Stable lowercase name, used in logs and file keys
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Name => "name",
            Self::ClassName => "class name",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A strategy + value pair identifying a UI element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    /// Lookup strategy
    pub strategy: Strategy,
    /// Selector value for the strategy
    pub value: String,
}

impl Locator {
    /// Create a locator with an explicit strategy
    #[must_use]
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    /// CSS selector locator
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::new(Strategy::Css, value)
    }

    /// XPath locator
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, value)
    }

    /// `name` attribute locator
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::new(Strategy::Name, value)
    }

    /// Class name locator
    #[must_use]
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, value)
    }

    /// Filesystem-safe token derived from the selector value.
    ///
    /// Used to key evidence screenshots by locator; anything outside
    /// `[A-Za-z0-9._-]` collapses to `_`.
    #[must_use]
    pub fn file_key(&self) -> String {
        let key: String = self
            .value
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        // Keep evidence file names bounded even for long XPath expressions.
        key.chars().take(80).collect()
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}='{}'", self.strategy, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use super::Strategy;

    #[test]
    fn test_constructors() {
        assert_eq!(Locator::css("div.row").strategy, Strategy::Css);
        assert_eq!(Locator::xpath("//div").strategy, Strategy::XPath);
        assert_eq!(Locator::name("username").strategy, Strategy::Name);
        assert_eq!(
            Locator::class_name("WelcomeMsgName").strategy,
            Strategy::ClassName
        );
    }

    #[test]
    fn test_display_matches_log_format() {
        let locator = Locator::name("sign in");
        assert_eq!(locator.to_string(), "name='sign in'");
    }

    #[test]
    fn test_equality_and_hashing() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Locator::css("button"));
        set.insert(Locator::css("button"));
        set.insert(Locator::xpath("button"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_file_key_sanitizes_xpath() {
        let locator = Locator::xpath("//button[contains(@class, 'PickItButton')]");
        let key = locator.file_key();
        assert!(!key.contains('/'));
        assert!(!key.contains('\''));
        assert!(key.contains("PickItButton"));
    }

    proptest! {
        #[test]
        fn file_key_is_always_filesystem_safe(value in ".{0,200}") {
            let key = Locator::xpath(value).file_key();
            prop_assert!(key.len() <= 80);
            prop_assert!(key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')));
        }

        #[test]
        fn display_embeds_value(value in "[a-zA-Z0-9 _-]{1,40}") {
            let locator = Locator::class_name(value.clone());
            prop_assert!(locator.to_string().contains(&value));
        }
    }
}
