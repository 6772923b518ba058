pub mod auth;
pub mod handlers;
pub mod templates;

use crate::components::session::SessionStore;
use crate::config::Config;
use auth::{SessionService, SESSION_COOKIE};
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use handlers::{
    clear_selection_handler, export_handler, health_handler, index_handler, login_handler,
    logout_handler, navigate_handler, oauth_callback_handler, select_event_handler,
    select_slot_handler,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::error;

/// Directory served under `/assets`
pub const ASSETS_DIR: &str = "assets";

#[derive(Clone)]
pub struct AppState {
    /// Configuration shared by every session
    pub config: Arc<Config>,
    /// Live scheduler sessions
    pub sessions: Arc<SessionStore>,
    /// Signs and checks session cookies
    pub session_service: Arc<SessionService>,
}

impl AppState {
    pub fn new(config: Arc<Config>, sessions: Arc<SessionStore>) -> Self {
        Self {
            session_service: Arc::new(SessionService::new(&config)),
            config,
            sessions,
        }
    }
}

/// Attach the caller's session, starting a guest session when the cookie is missing or invalid
async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let cookie_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.session_service.validate_token(cookie.value()));

    let (session_id, handle) = state.sessions.get_or_create(cookie_id).await;
    req.extensions_mut().insert(handle);

    let response = next.run(req).await;

    if cookie_id == Some(session_id) {
        return response;
    }

    match state.session_service.cookie(session_id) {
        Ok(cookie) => (jar.add(cookie), response).into_response(),
        Err(e) => {
            error!("Failed to issue session cookie: {:?}", e);
            response
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/login", get(login_handler))
        .route("/oauth/callback", get(oauth_callback_handler))
        .route("/logout", post(logout_handler))
        .route("/select/slot", post(select_slot_handler))
        .route("/select/event", post(select_event_handler))
        .route("/selection/clear", post(clear_selection_handler))
        .route("/selection/export", get(export_handler))
        .route("/navigate", get(navigate_handler))
        // Every route above needs a session
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .route("/health", get(health_handler))
        // Serve static files
        .nest_service("/assets", ServeDir::new(ASSETS_DIR))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
