use crate::error::{google_calendar_error, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Read-only event record fetched from the calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Sign-in state broadcast by a provider
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SignInState {
    #[default]
    SignedOut,
    SignedIn {
        /// Display name from the user's profile, if the provider returned one
        user_name: Option<String>,
    },
}

impl SignInState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SignInState::SignedIn { .. })
    }
}

/// OAuth token held for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Expiry as a unix timestamp
    pub expires_at: i64,
}

impl OAuthToken {
    /// Build a token from a token endpoint response.
    ///
    /// `previous_refresh` is kept when a refresh response carries no new refresh token.
    pub fn from_response(
        response: &Value,
        previous_refresh: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let access_token = response
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| google_calendar_error("Token response missing 'access_token' field"))?
            .to_string();

        let refresh_token = response
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .or(previous_refresh);

        let expires_in = response
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .unwrap_or(3600);

        Ok(Self {
            access_token,
            refresh_token,
            expires_at: now.timestamp() + expires_in,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp()
    }
}

/// Parse the `items` array of an `events.list` response.
///
/// Items without a `dateTime` start or end (all-day events) are skipped.
pub fn parse_events(response: &Value) -> AppResult<Vec<CalendarEvent>> {
    let items = response
        .get("items")
        .and_then(|i| i.as_array())
        .ok_or_else(|| google_calendar_error("No items in response"))?;

    let events = items
        .iter()
        .filter_map(|item| {
            let id = item.get("id").and_then(|id| id.as_str()).unwrap_or("").to_string();
            let title = item
                .get("summary")
                .and_then(|s| s.as_str())
                .unwrap_or("")
                .to_string();

            let start = parse_event_time(item, "start");
            let end = parse_event_time(item, "end");

            match (start, end) {
                (Some(start), Some(end)) => Some(CalendarEvent { id, title, start, end }),
                _ => {
                    debug!("Skipping event {} without a start/end dateTime", id);
                    None
                }
            }
        })
        .collect();

    Ok(events)
}

fn parse_event_time(item: &Value, field: &str) -> Option<DateTime<Utc>> {
    let raw = item
        .get(field)
        .and_then(|v| v.as_object())
        .and_then(|v| v.get("dateTime"))
        .and_then(|v| v.as_str())?;

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
