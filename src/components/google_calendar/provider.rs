use super::models::{CalendarEvent, SignInState};
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

/// What the scheduler needs from a calendar provider
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// URL the browser should visit to start signing in
    fn sign_in(&self, state: &str) -> AppResult<String>;

    /// Finish sign in with the authorization code from the redirect
    async fn complete_sign_in(&self, code: &str) -> AppResult<()>;

    /// Drop credentials and notify listeners
    async fn sign_out(&self) -> AppResult<()>;

    /// Subscribe to sign-in state changes
    fn on_sign_in_change(&self) -> watch::Receiver<SignInState>;

    /// Upcoming events starting from `now`, ordered by start time
    async fn list_upcoming_events(&self, now: DateTime<Utc>) -> AppResult<Vec<CalendarEvent>>;

    /// Stop any background work
    async fn shutdown(&self) -> AppResult<()> {
        Ok(())
    }
}
