use super::{update_sign_in_status, SchedulerSession};
use crate::components::google_calendar::{CalendarProvider, GoogleCalendarHandle};
use crate::config::Config;
use crate::error::AppResult;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Creates one calendar provider per session
pub trait ProviderFactory: Send + Sync {
    fn create(&self) -> Arc<dyn CalendarProvider>;
}

/// Spawns a Google Calendar actor for every session
pub struct GoogleProviderFactory {
    config: Arc<Config>,
    client: Client,
}

impl GoogleProviderFactory {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }
}

impl ProviderFactory for GoogleProviderFactory {
    fn create(&self) -> Arc<dyn CalendarProvider> {
        Arc::new(GoogleCalendarHandle::new(
            Arc::clone(&self.config),
            self.client.clone(),
        ))
    }
}

/// A session and the provider bound to it
#[derive(Clone)]
pub struct SessionHandle {
    pub session: Arc<Mutex<SchedulerSession>>,
    pub provider: Arc<dyn CalendarProvider>,
}

impl SessionHandle {
    /// Listen for sign-in changes and keep the session in sync.
    ///
    /// Ends once the provider drops its notifier.
    pub fn spawn_sign_in_listener(&self) -> JoinHandle<()> {
        let mut changes = self.provider.on_sign_in_change();
        let handle = self.clone();

        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let state = changes.borrow_and_update().clone();
                update_sign_in_status(&handle.session, &state, handle.provider.as_ref()).await;
            }
            debug!("Sign-in listener stopped");
        })
    }
}

/// How often idle sessions are looked for
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

struct StoredSession {
    handle: SessionHandle,
    last_seen: Instant,
}

/// All live sessions, keyed by the id carried in the session cookie
pub struct SessionStore {
    config: Arc<Config>,
    factory: Arc<dyn ProviderFactory>,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<Uuid, StoredSession>>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("config", &self.config)
            .finish()
    }
}

impl SessionStore {
    pub fn new(config: Arc<Config>, factory: Arc<dyn ProviderFactory>) -> Self {
        let minutes = u64::try_from(config.session_expiration_minutes).unwrap_or(0).max(1);
        Self {
            config,
            factory,
            idle_timeout: Duration::from_secs(minutes * 60),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Time without requests after which a session is dropped
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Today's date in the configured timezone
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.config.timezone).date_naive()
    }

    /// Look up a session, starting a new guest session when the id is unknown
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, SessionHandle) {
        if let Some(id) = id {
            if let Some(stored) = self.sessions.write().await.get_mut(&id) {
                stored.last_seen = Instant::now();
                return (id, stored.handle.clone());
            }
        }

        let id = Uuid::new_v4();
        let handle = SessionHandle {
            session: Arc::new(Mutex::new(SchedulerSession::new(&self.config, self.today()))),
            provider: self.factory.create(),
        };
        handle.spawn_sign_in_listener();

        self.sessions.write().await.insert(
            id,
            StoredSession {
                handle: handle.clone(),
                last_seen: Instant::now(),
            },
        );
        info!("Started session {}", id);

        (id, handle)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for longer than the cookie lifetime as of `now`.
    ///
    /// Returns how many were removed.
    pub async fn evict_idle(&self, now: Instant) -> usize {
        let expired: Vec<(Uuid, SessionHandle)> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, stored)| {
                    now.saturating_duration_since(stored.last_seen) >= self.idle_timeout
                })
                .map(|(id, _)| *id)
                .collect();

            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|stored| (id, stored.handle)))
                .collect()
        };

        for (id, handle) in &expired {
            if let Err(e) = handle.provider.shutdown().await {
                error!("Error shutting down idle session {}: {:?}", id, e);
            }
            debug!("Evicted idle session {}", id);
        }

        if !expired.is_empty() {
            info!("Evicted {} idle sessions", expired.len());
        }
        expired.len()
    }

    /// Periodically evict idle sessions until the runtime stops
    pub fn spawn_eviction(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(EVICTION_INTERVAL);
            loop {
                interval.tick().await;
                store.evict_idle(Instant::now()).await;
            }
        })
    }

    /// Shutdown every session's provider
    pub async fn shutdown_all(&self) -> AppResult<()> {
        info!("Shutting down all sessions");

        for (id, stored) in self.sessions.write().await.drain() {
            if let Err(e) = stored.handle.provider.shutdown().await {
                // Log error but continue with other sessions
                error!("Error shutting down session {}: {:?}", id, e);
            }
        }

        Ok(())
    }
}
