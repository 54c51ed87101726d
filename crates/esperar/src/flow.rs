//! Product flows: login, the welcome assertion, event interaction, and the
//! gallery audits for single-player accounts.
//!
//! Flows take the session and waits explicitly; nothing here owns state.
//! Assertions report [`Error::Assertion`] and are always gating; interaction
//! errors propagate for the run context to classify.

use crate::config::Credentials;
use crate::evidence::RunDir;
use crate::locator::Locator;
use crate::navigation::{selectors, EventNavigator, NavigationOutcome, NavigatorConfig};
use crate::result::{Error, Result};
use crate::session::Session;
use crate::wait::{is_element_present, WaitOptions, Waits};
use tracing::info;

/// Expected fragment of the post-login welcome banner
pub const WELCOME_TEXT: &str = "Hello Player";

/// Gallery links that must not be offered to single-player accounts
pub const RESTRICTED_GALLERY_LINKS: &[&str] = &["#/administration", "#/activities", "#/teams"];

/// Username input on the login page
#[must_use]
pub fn username_field() -> Locator {
    Locator::name("username")
}

/// Password input on the login page
#[must_use]
pub fn password_field() -> Locator {
    Locator::name("password")
}

/// Sign-in control on the login page
#[must_use]
pub fn sign_in_button() -> Locator {
    Locator::name("sign in")
}

/// Post-login welcome banner
#[must_use]
pub fn welcome_banner() -> Locator {
    Locator::class_name("WelcomeMsgName")
}

/// A link inside the gallery container, by href
#[must_use]
pub fn gallery_link(href: &str) -> Locator {
    Locator::xpath(format!(
        "//div[contains(@class, 'GlobalLibraryMainContainer')]//a[@href='{href}']"
    ))
}

/// Navigate to the login page and sign the player in.
pub fn login<S: Session>(
    session: &S,
    waits: &Waits<'_, S>,
    base_url: &str,
    credentials: &Credentials,
    options: &WaitOptions,
) -> Result<()> {
    session.goto(base_url)?;
    info!(url = base_url, "navigated to the login page");
    waits.page_loaded(options)?;

    waits.visible_and_clickable(&username_field(), options)?;
    session.send_keys(&username_field(), &credentials.username)?;
    info!("username entered");

    waits.visible_and_clickable(&password_field(), options)?;
    session.send_keys(&password_field(), &credentials.password)?;
    info!("password entered");

    waits.visible_and_clickable(&sign_in_button(), options)?;
    session.click(&sign_in_button())?;
    info!("sign-in clicked");
    Ok(())
}

/// Assert the welcome banner is shown and greets the player.
///
/// Returns the banner text on success; a missing greeting is an assertion
/// failure and gates the suite.
pub fn assert_welcome<S: Session>(
    session: &S,
    waits: &Waits<'_, S>,
    options: &WaitOptions,
) -> Result<String> {
    waits.visible_and_clickable(&welcome_banner(), options)?;
    let text = session.element_text(&welcome_banner())?;
    if !text.contains(WELCOME_TEXT) {
        return Err(Error::Assertion {
            message: format!("welcome message should contain {WELCOME_TEXT:?}, got {text:?}"),
        });
    }
    info!(%text, "welcome message verified");
    Ok(text)
}

/// Locate the configured event and join it, whichever context is showing.
pub fn interact_with_event<'a, S: Session>(
    session: &'a S,
    config: &'a NavigatorConfig,
    run_dir: Option<&'a RunDir>,
) -> Result<NavigationOutcome> {
    let mut navigator = EventNavigator::new(session, config);
    if let Some(run_dir) = run_dir {
        navigator = navigator.with_evidence(run_dir);
    }
    navigator.run()
}

/// Open the gallery and assert none of the restricted links are offered.
pub fn assert_gallery_excludes<S: Session>(
    session: &S,
    waits: &Waits<'_, S>,
    options: &WaitOptions,
    restricted: &[&str],
) -> Result<()> {
    waits.visible_and_clickable(&selectors::gallery_button(), options)?;
    session.click(&selectors::gallery_button())?;
    info!("clicked the gallery control");
    waits.visible_and_clickable(&selectors::library_container(), options)?;
    info!("gallery is displayed");

    for &href in restricted {
        let link = gallery_link(href);
        let matches = session.find(&link)?;
        if matches > 0 {
            return Err(Error::Assertion {
                message: format!("restricted link {href:?} must not be offered, found {matches}"),
            });
        }
        info!(href, "restricted link absent, as expected");
    }
    Ok(())
}

/// Assert the library button is not offered to this account.
///
/// A short clickable wait must time out; the button becoming clickable is
/// the assertion failure.
pub fn assert_library_button_absent<S: Session>(
    waits: &Waits<'_, S>,
    options: &WaitOptions,
) -> Result<()> {
    match waits.visible_and_clickable(&selectors::library_button(), options) {
        Ok(_) => Err(Error::Assertion {
            message: "library button must not be visible for this account".to_string(),
        }),
        Err(Error::Timeout { .. }) => {
            info!("library button not found, as expected");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Open the library via the gallery control, closing it first if it is
/// already open, and assert the library title appears.
pub fn ensure_library_open_via_gallery<S: Session>(
    session: &S,
    waits: &Waits<'_, S>,
    options: &WaitOptions,
) -> Result<()> {
    if is_element_present(session, &selectors::library_title()) {
        info!("library already open; closing it first");
        close_library(session, waits, options)?;
    }

    waits.visible_and_clickable(&selectors::gallery_button(), options)?;
    session.click(&selectors::gallery_button())?;
    info!("clicked the gallery control");

    waits.visible(&selectors::library_title(), options)?;
    if !session.is_displayed(&selectors::library_title())? {
        return Err(Error::Assertion {
            message: "library title should be visible after opening the gallery".to_string(),
        });
    }
    info!("library title visible after opening the gallery");
    Ok(())
}

/// Close the library overlay.
pub fn close_library<S: Session>(
    session: &S,
    waits: &Waits<'_, S>,
    options: &WaitOptions,
) -> Result<()> {
    waits.visible_and_clickable(&selectors::library_close_button(), options)?;
    session.click(&selectors::library_close_button())?;
    info!("library closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Effect, FakeSession};

    fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(200).with_poll_interval(10)
    }

    fn login_page(session: &FakeSession) {
        session.insert_visible(username_field(), "");
        session.insert_visible(password_field(), "");
        session.insert_visible(sign_in_button(), "Sign in");
    }

    mod login_tests {
        use super::*;

        #[test]
        fn test_login_types_credentials_and_signs_in() {
            let session = FakeSession::new();
            login_page(&session);
            let waits = Waits::new(&session);
            let credentials = Credentials::default();

            login(
                &session,
                &waits,
                "https://lobby.example/login",
                &credentials,
                &fast(),
            )
            .unwrap();

            assert_eq!(
                session.typed_into(&username_field()).as_deref(),
                Some("user@example.com")
            );
            assert_eq!(session.typed_into(&password_field()).as_deref(), Some("secret"));
            assert_eq!(
                session.call_count(&format!("click:{}", sign_in_button())),
                1
            );
            assert_eq!(
                session.current_url().unwrap(),
                "https://lobby.example/login"
            );
        }

        #[test]
        fn test_login_fails_when_form_is_absent() {
            let session = FakeSession::new();
            let waits = Waits::new(&session);
            let err = login(
                &session,
                &waits,
                "https://lobby.example/login",
                &Credentials::default(),
                &fast(),
            )
            .unwrap_err();
            assert!(err.is_timeout());
        }
    }

    mod welcome_tests {
        use super::*;

        #[test]
        fn test_welcome_passes_on_greeting() {
            let session = FakeSession::new();
            session.insert_visible(welcome_banner(), "Hello Player John");
            let waits = Waits::new(&session);
            let text = assert_welcome(&session, &waits, &fast()).unwrap();
            assert_eq!(text, "Hello Player John");
        }

        #[test]
        fn test_welcome_mismatch_is_assertion_failure() {
            let session = FakeSession::new();
            session.insert_visible(welcome_banner(), "Hello Guest");
            let waits = Waits::new(&session);
            let err = assert_welcome(&session, &waits, &fast()).unwrap_err();
            assert!(err.is_assertion());
        }
    }

    mod gallery_tests {
        use super::*;

        fn gallery(session: &FakeSession) {
            session.insert_visible(selectors::gallery_button(), "Gallery");
            session.insert_visible(selectors::library_container(), "");
        }

        #[test]
        fn test_restricted_links_absent_passes() {
            let session = FakeSession::new();
            gallery(&session);
            let waits = Waits::new(&session);
            assert_gallery_excludes(&session, &waits, &fast(), RESTRICTED_GALLERY_LINKS).unwrap();
        }

        #[test]
        fn test_offered_restricted_link_is_assertion_failure() {
            let session = FakeSession::new();
            gallery(&session);
            session.insert_visible(gallery_link("#/administration"), "Administration");
            let waits = Waits::new(&session);
            let err = assert_gallery_excludes(&session, &waits, &fast(), RESTRICTED_GALLERY_LINKS)
                .unwrap_err();
            assert!(err.is_assertion());
            assert!(err.to_string().contains("#/administration"));
        }

        #[test]
        fn test_library_button_absence_audit() {
            let session = FakeSession::new();
            let waits = Waits::new(&session);
            assert_library_button_absent(&waits, &fast()).unwrap();

            session.insert_visible(selectors::library_button(), "Library");
            let err = assert_library_button_absent(&waits, &fast()).unwrap_err();
            assert!(err.is_assertion());
        }

        #[test]
        fn test_open_library_via_gallery() {
            let session = FakeSession::new();
            session.insert_visible(selectors::gallery_button(), "Gallery");
            session.on_click(
                selectors::gallery_button(),
                vec![Effect::Reveal(selectors::library_title())],
            );
            let waits = Waits::new(&session);
            ensure_library_open_via_gallery(&session, &waits, &fast()).unwrap();
            assert!(is_element_present(&session, &selectors::library_title()));
        }

        #[test]
        fn test_open_library_closes_existing_overlay_first() {
            let session = FakeSession::new();
            session.insert_visible(selectors::library_title(), "Global Library");
            session.insert_visible(selectors::library_close_button(), "x");
            session.insert_visible(selectors::gallery_button(), "Gallery");
            session.on_click(
                selectors::library_close_button(),
                vec![Effect::Remove(selectors::library_title())],
            );
            session.on_click(
                selectors::gallery_button(),
                vec![Effect::Reveal(selectors::library_title())],
            );

            let waits = Waits::new(&session);
            ensure_library_open_via_gallery(&session, &waits, &fast()).unwrap();
            assert_eq!(
                session.call_count(&format!("click:{}", selectors::library_close_button())),
                1
            );
            assert_eq!(
                session.call_count(&format!("click:{}", selectors::gallery_button())),
                1
            );
        }
    }
}
