use super::models::{parse_events, CalendarEvent, SignInState};
use super::token::TokenManager;
use crate::config::Config;
use crate::error::{google_calendar_error, AppResult};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use url::Url;

/// The Google Calendar actor that processes messages
pub struct GoogleCalendarActor {
    config: Arc<Config>,
    token_manager: TokenManager,
    client: Client,
    command_rx: mpsc::Receiver<GoogleCalendarCommand>,
    state_tx: watch::Sender<SignInState>,
}

/// Commands that can be sent to the Google Calendar actor
pub enum GoogleCalendarCommand {
    CompleteSignIn(String, mpsc::Sender<AppResult<()>>),
    SignOut(mpsc::Sender<AppResult<()>>),
    GetUpcomingEvents(DateTime<Utc>, mpsc::Sender<AppResult<Vec<CalendarEvent>>>),
    Shutdown,
}

/// Handle for communicating with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarActorHandle {
    command_tx: mpsc::Sender<GoogleCalendarCommand>,
    state_rx: watch::Receiver<SignInState>,
}

impl GoogleCalendarActorHandle {
    /// Exchange the authorization code and mark the session signed in
    pub async fn complete_sign_in(&self, code: &str) -> AppResult<()> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::CompleteSignIn(code.to_string(), response_tx))
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Forget the token and mark the session signed out
    pub async fn sign_out(&self) -> AppResult<()> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::SignOut(response_tx))
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Get upcoming events from the calendar
    pub async fn get_upcoming_events(&self, now: DateTime<Utc>) -> AppResult<Vec<CalendarEvent>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::GetUpcomingEvents(now, response_tx))
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Subscribe to sign-in state changes
    pub fn subscribe(&self) -> watch::Receiver<SignInState> {
        self.state_rx.clone()
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        let _ = self.command_tx.send(GoogleCalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl GoogleCalendarActor {
    /// Create a new actor and return its handle
    pub fn new(config: Arc<Config>, client: Client) -> (Self, GoogleCalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(SignInState::SignedOut);

        let actor = Self {
            token_manager: TokenManager::new(Arc::clone(&config), client.clone()),
            config,
            client,
            command_rx,
            state_tx,
        };

        let handle = GoogleCalendarActorHandle {
            command_tx,
            state_rx,
        };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Google Calendar actor started");

        // Process commands
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                GoogleCalendarCommand::CompleteSignIn(code, response_tx) => {
                    let result = self.complete_sign_in(&code).await;
                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::SignOut(response_tx) => {
                    self.token_manager.clear();
                    self.state_tx.send_replace(SignInState::SignedOut);
                    info!("Signed out of Google Calendar");
                    let _ = response_tx.send(Ok(())).await;
                }
                GoogleCalendarCommand::GetUpcomingEvents(now, response_tx) => {
                    let result = self.get_upcoming_events(now).await;
                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::Shutdown => {
                    info!("Google Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Google Calendar actor shut down");
    }

    async fn complete_sign_in(&mut self, code: &str) -> AppResult<()> {
        self.token_manager.exchange_code(code).await?;

        // A missing profile still counts as signed in
        let user_name = match self.fetch_user_name().await {
            Ok(name) => name,
            Err(e) => {
                warn!("Failed to fetch user profile: {:?}", e);
                None
            }
        };

        info!("Signed in to Google Calendar");
        self.state_tx.send_replace(SignInState::SignedIn { user_name });
        Ok(())
    }

    /// Display name of the signed-in user
    async fn fetch_user_name(&mut self) -> AppResult<Option<String>> {
        let access_token = self.token_manager.access_token().await?;
        let url = self.api_url(&["oauth2", "v3", "userinfo"])?;

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to fetch profile: {}", e)))?;

        if !response.status().is_success() {
            return Err(google_calendar_error(&format!(
                "Failed to fetch profile: HTTP {}",
                response.status()
            )));
        }

        let profile: serde_json::Value = response.json().await?;
        Ok(profile
            .get("name")
            .and_then(|n| n.as_str())
            .map(|n| n.to_string()))
    }

    /// Get upcoming events from the calendar
    async fn get_upcoming_events(&mut self, now: DateTime<Utc>) -> AppResult<Vec<CalendarEvent>> {
        let access_token = self.token_manager.access_token().await?;

        let calendar_id = self.config.google_calendar_id.clone();
        let mut url = self.api_url(&["calendar", "v3", "calendars", &calendar_id, "events"])?;

        url.query_pairs_mut()
            .append_pair("timeMin", &now.to_rfc3339())
            .append_pair("showDeleted", "false")
            .append_pair("singleEvents", "true")
            .append_pair("maxResults", &self.config.max_results.to_string())
            .append_pair("orderBy", "startTime");

        // Make API request
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to fetch events: HTTP {} - {}",
                status, error_body
            )));
        }

        let response_data: serde_json::Value = response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse events response: {}", e))
        })?;

        let events = parse_events(&response_data)?;
        info!("Fetched {} upcoming events", events.len());
        Ok(events)
    }

    fn api_url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&self.config.google_api_base)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| google_calendar_error("API base URL cannot have a path"))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }
}
