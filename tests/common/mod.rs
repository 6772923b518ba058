#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Asia::Tokyo;
use nittei::components::google_calendar::{CalendarEvent, CalendarProvider, SignInState};
use nittei::components::session::ProviderFactory;
use nittei::error::{auth_error, google_calendar_error, AppResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Event in Tokyo time on a day of June 2023
pub fn tokyo_event(id: &str, day: u32, start: (u32, u32), end: (u32, u32)) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        title: format!("Event {}", id),
        start: Tokyo
            .with_ymd_and_hms(2023, 6, day, start.0, start.1, 0)
            .unwrap()
            .with_timezone(&Utc),
        end: Tokyo
            .with_ymd_and_hms(2023, 6, day, end.0, end.1, 0)
            .unwrap()
            .with_timezone(&Utc),
    }
}

/// In-memory provider standing in for Google Calendar
pub struct MockProvider {
    state_tx: watch::Sender<SignInState>,
    events: Mutex<Vec<CalendarEvent>>,
    fail_fetch: AtomicBool,
    fetch_count: AtomicUsize,
    shut_down: AtomicBool,
    user_name: Option<String>,
}

impl MockProvider {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        let (state_tx, _) = watch::channel(SignInState::SignedOut);
        Self {
            state_tx,
            events: Mutex::new(events),
            fail_fetch: AtomicBool::new(false),
            fetch_count: AtomicUsize::new(0),
            shut_down: AtomicBool::new(false),
            user_name: Some("Taro".to_string()),
        }
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_events(&self, events: Vec<CalendarEvent>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarProvider for MockProvider {
    fn sign_in(&self, state: &str) -> AppResult<String> {
        Ok(format!("https://provider.test/auth?state={}", state))
    }

    async fn complete_sign_in(&self, code: &str) -> AppResult<()> {
        if code == "bad" {
            return Err(auth_error("invalid_grant"));
        }
        self.state_tx.send_replace(SignInState::SignedIn {
            user_name: self.user_name.clone(),
        });
        Ok(())
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.state_tx.send_replace(SignInState::SignedOut);
        Ok(())
    }

    fn on_sign_in_change(&self) -> watch::Receiver<SignInState> {
        self.state_tx.subscribe()
    }

    async fn list_upcoming_events(&self, _now: DateTime<Utc>) -> AppResult<Vec<CalendarEvent>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(google_calendar_error("network down"));
        }
        Ok(self.events.lock().unwrap().clone())
    }

    async fn shutdown(&self) -> AppResult<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out one mock provider per session and remembers them
#[derive(Default)]
pub struct MockProviderFactory {
    events: Vec<CalendarEvent>,
    created: Mutex<Vec<Arc<MockProvider>>>,
}

impl MockProviderFactory {
    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events,
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn last(&self) -> Arc<MockProvider> {
        self.created
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no provider created yet")
    }

    pub fn created(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<Arc<MockProvider>> {
        self.created.lock().unwrap().clone()
    }
}

impl ProviderFactory for MockProviderFactory {
    fn create(&self) -> Arc<dyn CalendarProvider> {
        let provider = Arc::new(MockProvider::new(self.events.clone()));
        self.created.lock().unwrap().push(Arc::clone(&provider));
        provider
    }
}

/// Poll `check` until it passes or a second has gone by
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
