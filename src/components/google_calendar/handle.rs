use super::actor::GoogleCalendarActorHandle;
use super::models::{CalendarEvent, SignInState};
use super::provider::CalendarProvider;
use super::token::TokenManager;
use crate::config::Config;
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle for interacting with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarHandle {
    config: Arc<Config>,
    actor_handle: GoogleCalendarActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl GoogleCalendarHandle {
    /// Create a new GoogleCalendarHandle and spawn the actor
    pub fn new(config: Arc<Config>, client: Client) -> Self {
        use super::actor::GoogleCalendarActor;

        // Create the actor and get its handle
        let (mut actor, handle) = GoogleCalendarActor::new(Arc::clone(&config), client);

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            config,
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarHandle {
    fn sign_in(&self, state: &str) -> AppResult<String> {
        TokenManager::authorization_url(&self.config, state)
    }

    async fn complete_sign_in(&self, code: &str) -> AppResult<()> {
        self.actor_handle.complete_sign_in(code).await
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.actor_handle.sign_out().await
    }

    fn on_sign_in_change(&self) -> watch::Receiver<SignInState> {
        self.actor_handle.subscribe()
    }

    async fn list_upcoming_events(&self, now: DateTime<Utc>) -> AppResult<Vec<CalendarEvent>> {
        self.actor_handle.get_upcoming_events(now).await
    }

    async fn shutdown(&self) -> AppResult<()> {
        self.actor_handle.shutdown().await
    }
}
