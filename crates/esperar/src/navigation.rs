//! Navigation state machine for locating and joining an event.
//!
//! The UI shows one of several mutually exclusive contexts: the Global
//! Library overlay (a searchable catalog), the Lobby listing of joinable
//! events, or just the gallery control that opens the library. Which one is
//! showing is only knowable by probing the live DOM, so state is derived
//! fresh at every decision point and never cached.
//!
//! Branch policy: an open Global Library supersedes the Lobby as the active
//! context, so the library probe always wins when both would match.

use crate::locator::Locator;
use crate::result::{Error, Result};
use crate::session::{Session, SCROLL_TO_BOTTOM_SCRIPT};
use crate::wait::{is_element_present, wait_until, WaitOptions, Waits};
use crate::evidence::RunDir;
use tracing::{debug, info, warn};

/// Timeout for the join control to appear (queueing/matchmaking delay)
pub const JOIN_BUTTON_TIMEOUT_MS: u64 = 240_000;

/// Default cap on scroll-and-retry rounds while searching the library
pub const DEFAULT_MAX_SCROLL_ROUNDS: usize = 20;

/// Product selectors for the lobby and library UI
pub mod selectors {
    use crate::locator::Locator;

    /// Container of the Global Library overlay; its presence means the
    /// library is the active context
    #[must_use]
    pub fn library_container() -> Locator {
        Locator::xpath("//div[contains(@class, 'GlobalLibraryMainContainer')]")
    }

    /// Title element of the Global Library overlay
    #[must_use]
    pub fn library_title() -> Locator {
        Locator::xpath("//div[contains(@class, 'GlobalLibraryTitle')]")
    }

    /// Control that closes the Global Library overlay
    #[must_use]
    pub fn library_close_button() -> Locator {
        Locator::class_name("close_GlobalLibrary_button")
    }

    /// Library button shown to privileged accounts only
    #[must_use]
    pub fn library_button() -> Locator {
        Locator::class_name("GlobalLibraryButton")
    }

    /// Search input of the Global Library
    #[must_use]
    pub fn search_field() -> Locator {
        Locator::xpath("//input[@class='search-filter_search_field__1ZFKm']")
    }

    /// All search result rows, regardless of event name
    #[must_use]
    pub fn result_rows() -> Locator {
        Locator::xpath("//div[contains(@class, 'CampaignName')]")
    }

    /// Action control revealed by hovering a library result row
    #[must_use]
    pub fn pick_button() -> Locator {
        Locator::xpath("//button[contains(@class, 'PickItButton')]")
    }

    /// Join control revealed by hovering a lobby event row
    #[must_use]
    pub fn join_button() -> Locator {
        Locator::xpath("//button[contains(@class, 'LobbyJoinButton')]")
    }

    /// Control that opens the Global Library from the lobby
    #[must_use]
    pub fn gallery_button() -> Locator {
        Locator::xpath("//button[contains(@class, 'GlobalGalleryButton')]")
    }
}

/// Observable UI context, derived by probing the live DOM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    /// The Global Library overlay is open
    GlobalLibraryOpen,
    /// The lobby listing shows the target event
    LobbyListing,
    /// Only the gallery-access control is available
    GlobalGalleryAvailable,
    /// None of the known contexts matched
    Unknown,
}

impl std::fmt::Display for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::GlobalLibraryOpen => "global library open",
            Self::LobbyListing => "lobby listing",
            Self::GlobalGalleryAvailable => "global gallery available",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Result of a navigation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The flow reached its terminal interaction in the given context
    Success(UiState),
    /// A non-gating wait expired; the last probed context is reported
    TimedOut(UiState),
    /// The target was never found; carries the locator that stayed absent
    ElementMissing(Locator),
}

/// Configuration for one event navigation attempt
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    /// Event to locate and join
    pub event_name: String,
    /// Wait for controls that must be clickable (search field, gallery)
    pub clickable: WaitOptions,
    /// Wait for the event entry in the lobby listing
    pub lobby: WaitOptions,
    /// Wait for hover-revealed controls
    pub control: WaitOptions,
    /// Wait for the join control (covers matchmaking delay)
    pub join: WaitOptions,
    /// Wait for the post-join confirmation text
    pub confirm: WaitOptions,
    /// Wait for the search result count to stabilize
    pub settle: WaitOptions,
    /// Cap on scroll-and-retry rounds in the library search
    pub max_scroll_rounds: usize,
}

impl NavigatorConfig {
    /// Defaults for the given event name
    #[must_use]
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            clickable: WaitOptions::default(),
            lobby: WaitOptions::default(),
            control: WaitOptions::default(),
            join: WaitOptions::new().with_timeout(JOIN_BUTTON_TIMEOUT_MS),
            confirm: WaitOptions::default(),
            settle: WaitOptions::new().with_timeout(5_000).with_poll_interval(250),
            max_scroll_rounds: DEFAULT_MAX_SCROLL_ROUNDS,
        }
    }

    /// Set the scroll-and-retry cap
    #[must_use]
    pub const fn with_max_scroll_rounds(mut self, rounds: usize) -> Self {
        self.max_scroll_rounds = rounds;
        self
    }

    /// Set the join-control wait
    #[must_use]
    pub const fn with_join(mut self, options: WaitOptions) -> Self {
        self.join = options;
        self
    }

    /// Event row in the library search results
    #[must_use]
    pub fn library_row(&self) -> Locator {
        Locator::xpath(format!(
            "//div[contains(@class, 'CampaignName') and text()='{}']",
            self.event_name
        ))
    }

    /// Event row in the lobby listing
    #[must_use]
    pub fn lobby_row(&self) -> Locator {
        Locator::xpath(format!(
            "//div[@class='sc-eNSrOW bfIymq EventsGalleryItemContainer']\
             //span[contains(@class, 'sc-kCMKrZ') and text()='{}']",
            self.event_name
        ))
    }

    /// Post-join confirmation banner
    #[must_use]
    pub fn confirmation_text(&self) -> Locator {
        Locator::xpath(format!(
            "//span[contains(text(), 'Welcome to {}')]",
            self.event_name
        ))
    }
}

/// Probe the live DOM for the current UI context.
///
/// Zero-timeout existence checks only; never blocks, never raises. The
/// library wins over the lobby because an open overlay supersedes the
/// listing behind it.
pub fn probe_ui_state<S: Session>(session: &S, config: &NavigatorConfig) -> UiState {
    if is_element_present(session, &selectors::library_container()) {
        UiState::GlobalLibraryOpen
    } else if is_element_present(session, &config.lobby_row()) {
        UiState::LobbyListing
    } else if is_element_present(session, &selectors::gallery_button()) {
        UiState::GlobalGalleryAvailable
    } else {
        UiState::Unknown
    }
}

/// Drives one attempt to locate and join the configured event.
pub struct EventNavigator<'a, S: Session> {
    session: &'a S,
    config: &'a NavigatorConfig,
    waits: Waits<'a, S>,
}

impl<S: Session> std::fmt::Debug for EventNavigator<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventNavigator")
            .field("event_name", &self.config.event_name)
            .finish_non_exhaustive()
    }
}

impl<'a, S: Session> EventNavigator<'a, S> {
    /// Create a navigator over a session
    #[must_use]
    pub fn new(session: &'a S, config: &'a NavigatorConfig) -> Self {
        Self {
            session,
            config,
            waits: Waits::new(session),
        }
    }

    /// Capture failure screenshots into `run_dir`
    #[must_use]
    pub fn with_evidence(mut self, run_dir: &'a RunDir) -> Self {
        self.waits = Waits::new(self.session).with_evidence(run_dir);
        self
    }

    /// Run the state machine to a terminal outcome.
    ///
    /// Probes the current context, then drives exactly one of the three
    /// sub-flows to completion. Waits inside the sub-flows propagate their
    /// errors except where noted on [`NavigationOutcome`].
    pub fn run(&self) -> Result<NavigationOutcome> {
        if is_element_present(self.session, &selectors::library_container()) {
            info!(event = %self.config.event_name, "Global Library is open; searching for the event");
            return self.search_in_library();
        }

        info!(event = %self.config.event_name, "Global Library not open; checking the lobby listing");
        match self.waits.visible(&self.config.lobby_row(), &self.config.lobby) {
            Ok(_) => {
                info!(event = %self.config.event_name, "event found in the lobby");
                self.join_in_lobby()
            }
            Err(Error::Timeout { .. }) => {
                warn!(event = %self.config.event_name, "event not in the lobby; opening the gallery");
                self.open_gallery()
            }
            Err(err) => Err(err),
        }
    }

    /// Type the event name into the library search and pick the result.
    ///
    /// The result list loads incrementally, so an absent row triggers a
    /// scroll-to-bottom and re-probe, capped at `max_scroll_rounds`.
    fn search_in_library(&self) -> Result<NavigationOutcome> {
        let field = selectors::search_field();
        self.waits.visible_and_clickable(&field, &self.config.clickable)?;
        self.session.clear(&field)?;
        self.session.send_keys(&field, &self.config.event_name)?;
        info!(event = %self.config.event_name, "entered the event name in the search field");
        self.wait_for_results_to_settle();

        let row = self.config.library_row();
        for round in 0..=self.config.max_scroll_rounds {
            if is_element_present(self.session, &row) {
                info!(event = %self.config.event_name, "event found in the Global Library");
                self.session.hover(&row)?;
                let pick = selectors::pick_button();
                self.waits.visible(&pick, &self.config.control)?;
                self.session.click(&pick)?;
                info!("clicked the pick control");
                return Ok(NavigationOutcome::Success(UiState::GlobalLibraryOpen));
            }
            if round == self.config.max_scroll_rounds {
                break;
            }
            self.session.execute_script(SCROLL_TO_BOTTOM_SCRIPT)?;
            debug!(round = round + 1, "scrolled down to load more events");
            self.wait_for_results_to_settle();
        }

        warn!(
            locator = %row,
            rounds = self.config.max_scroll_rounds,
            "event not found after exhausting scroll rounds"
        );
        Ok(NavigationOutcome::ElementMissing(row))
    }

    /// Hover the lobby row, join, and watch for the confirmation banner.
    ///
    /// The confirmation is the one non-gating wait in the machine: its
    /// timeout is logged and reported as [`NavigationOutcome::TimedOut`].
    fn join_in_lobby(&self) -> Result<NavigationOutcome> {
        let row = self.config.lobby_row();
        self.session.hover(&row)?;
        info!("hovered over the event entry in the lobby");

        let join = selectors::join_button();
        self.waits.visible(&join, &self.config.join)?;
        self.session.click(&join)?;
        info!("clicked the join control");

        match self
            .waits
            .visible(&self.config.confirmation_text(), &self.config.confirm)
        {
            Ok(_) => {
                info!(event = %self.config.event_name, "confirmation observed; event joined");
                Ok(NavigationOutcome::Success(UiState::LobbyListing))
            }
            Err(Error::Timeout { .. }) => {
                warn!(event = %self.config.event_name, "join confirmation not observed");
                Ok(NavigationOutcome::TimedOut(UiState::LobbyListing))
            }
            Err(err) => Err(err),
        }
    }

    /// Click the gallery control to move the UI toward the library view.
    ///
    /// Terminal: control returns to the caller, who must re-probe from the
    /// top if further navigation is wanted.
    fn open_gallery(&self) -> Result<NavigationOutcome> {
        let gallery = selectors::gallery_button();
        self.waits
            .visible_and_clickable(&gallery, &self.config.clickable)?;
        self.session.click(&gallery)?;
        info!("clicked the gallery control");
        Ok(NavigationOutcome::Success(UiState::GlobalGalleryAvailable))
    }

    /// Wait for the search result count to hold across two polls.
    ///
    /// Best effort: an unsettled list is logged and tolerated, since a late
    /// row is still caught by the scroll-and-retry probes.
    fn wait_for_results_to_settle(&self) {
        let rows = selectors::result_rows();
        let mut last: Option<usize> = None;
        let result = wait_until(
            || {
                let count = self.session.find(&rows).unwrap_or(0);
                let stable = last == Some(count);
                last = Some(count);
                Ok(stable)
            },
            &self.config.settle,
            "search result count stabilized",
        );
        match result {
            Ok(outcome) => debug!(
                rows = last.unwrap_or(0),
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "search results settled"
            ),
            Err(err) => warn!(%err, "search results did not settle; proceeding"),
        }
    }
}
