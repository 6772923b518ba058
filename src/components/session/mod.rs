mod store;

pub use store::{GoogleProviderFactory, ProviderFactory, SessionHandle, SessionStore};

use crate::components::google_calendar::{CalendarEvent, CalendarProvider, SignInState};
use crate::components::selection::SelectionLedger;
use crate::components::view::{navigate, Direction, WeekView};
use crate::config::{Config, ViewConfig};
use crate::error::AppResult;
use crate::utils::time::{format_day_label, format_time_range};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use rust_i18n::t;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// State of one browser session: who is signed in, what is on screen, what was picked
#[derive(Debug)]
pub struct SchedulerSession {
    timezone: Tz,
    view: ViewConfig,
    user_name: Option<String>,
    signed_in: bool,
    events: Vec<CalendarEvent>,
    ledger: SelectionLedger,
    visible_date: NaiveDate,
    pending_sign_in: Option<String>,
}

impl SchedulerSession {
    /// Fresh guest session showing the week of `today`
    pub fn new(config: &Config, today: NaiveDate) -> Self {
        Self {
            timezone: config.timezone,
            view: config.view.clone(),
            user_name: None,
            signed_in: false,
            events: Vec::new(),
            ledger: SelectionLedger::new(),
            visible_date: today,
            pending_sign_in: None,
        }
    }

    /// Record a clicked or dragged slot
    pub fn select_slot<Z: TimeZone>(&mut self, start: &DateTime<Z>, end: &DateTime<Z>) {
        let start = start.with_timezone(&self.timezone);
        let end = end.with_timezone(&self.timezone);
        self.record(format_day_label(&start), format_time_range(&start, &end));
    }

    /// Record the time range of a clicked event; unknown ids are ignored
    pub fn select_event(&mut self, event_id: &str) -> bool {
        let Some(event) = self.events.iter().find(|e| e.id == event_id) else {
            warn!("Selected event {} is not loaded", event_id);
            return false;
        };

        let start = event.start.with_timezone(&self.timezone);
        let end = event.end.with_timezone(&self.timezone);
        self.record(format_day_label(&start), format_time_range(&start, &end));
        true
    }

    fn record(&mut self, date: String, time: String) {
        info!("Selected {} {}", date, time);
        self.ledger.record_selection(&date, &time);
    }

    pub fn clear_selection(&mut self) {
        self.ledger.clear();
    }

    pub fn export_selection(&self) -> String {
        self.ledger.export()
    }

    pub fn ledger(&self) -> &SelectionLedger {
        &self.ledger
    }

    /// React to a sign-in notification.
    ///
    /// Signing out drops the user name and loaded events but keeps the selection.
    pub fn apply_sign_in_state(&mut self, state: &SignInState) {
        match state {
            SignInState::SignedIn { user_name } => {
                self.signed_in = true;
                self.user_name = user_name.clone();
            }
            SignInState::SignedOut => {
                self.signed_in = false;
                self.user_name = None;
                self.events.clear();
            }
        }
    }

    pub fn set_events(&mut self, events: Vec<CalendarEvent>) {
        self.events = events;
    }

    /// Explicit logout: everything the user saw or picked is dropped
    pub fn logout(&mut self) {
        self.apply_sign_in_state(&SignInState::SignedOut);
        self.ledger.clear();
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn visible_date(&self) -> NaiveDate {
        self.visible_date
    }

    pub fn set_visible_date(&mut self, date: NaiveDate) {
        self.visible_date = date;
    }

    /// Move the visible week and return the new visible date
    pub fn navigate(&mut self, direction: Direction, today: NaiveDate) -> NaiveDate {
        self.visible_date = navigate(self.visible_date, direction, today);
        self.visible_date
    }

    pub fn week_view(&self, today: NaiveDate) -> AppResult<WeekView> {
        WeekView::build(
            self.visible_date,
            today,
            &self.events,
            &self.ledger,
            &self.timezone,
            &self.view,
        )
    }

    /// Greeting shown at the top of the page
    pub fn greeting(&self) -> String {
        match &self.user_name {
            Some(name) => t!("greeting_user", name = name).to_string(),
            None => t!("greeting_guest").to_string(),
        }
    }

    /// Remember the OAuth `state` handed to the provider
    pub fn begin_sign_in(&mut self, state: String) {
        self.pending_sign_in = Some(state);
    }

    /// Check and consume the OAuth `state` returned by the provider
    pub fn finish_sign_in(&mut self, state: &str) -> bool {
        matches!(self.pending_sign_in.take(), Some(expected) if expected == state)
    }
}

/// Apply a sign-in notification and, when signed in, load upcoming events.
///
/// A failed fetch is logged and leaves the previously loaded events in place.
pub async fn update_sign_in_status(
    session: &Mutex<SchedulerSession>,
    state: &SignInState,
    provider: &dyn CalendarProvider,
) {
    session.lock().await.apply_sign_in_state(state);

    if !state.is_signed_in() {
        return;
    }

    match provider.list_upcoming_events(Utc::now()).await {
        Ok(events) => session.lock().await.set_events(events),
        Err(e) => error!("Error fetching events: {:?}", e),
    }
}
