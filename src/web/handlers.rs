use super::templates::SchedulerPage;
use super::AppState;
use crate::components::session::SessionHandle;
use crate::components::view::{displayable_week, Direction, SLOT_FORMAT};
use crate::error::Error;
use askama::Template;
use axum::{
    extract::{Extension, Form, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{NaiveDate, NaiveDateTime, TimeZone};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Errors surfaced by the web handlers
#[derive(Debug)]
pub enum WebError {
    /// Malformed input from the page
    BadRequest(String),
    /// Anything else, logged and hidden from the user
    Internal(Error),
}

impl From<Error> for WebError {
    fn from(err: Error) -> Self {
        WebError::Internal(err)
    }
}

impl From<askama::Error> for WebError {
    fn from(err: askama::Error) -> Self {
        WebError::Internal(Error::from(err))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::BadRequest(message) => {
                warn!("Bad request: {}", message);
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            WebError::Internal(err) => {
                error!("Request failed: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Parse a `?date=` value, refusing dates whose week cannot be drawn
fn parse_date(value: &str) -> Result<NaiveDate, WebError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .filter(|date| displayable_week(*date).is_some())
        .ok_or_else(|| WebError::BadRequest(format!("Invalid date: {}", value)))
}

fn redirect_to_week(date: NaiveDate) -> Redirect {
    Redirect::to(&format!("/?date={}", date.format("%Y-%m-%d")))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub date: Option<String>,
}

/// Handler for the scheduler page
pub async fn index_handler(
    State(state): State<AppState>,
    Extension(handle): Extension<SessionHandle>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, WebError> {
    let mut session = handle.session.lock().await;

    if let Some(date) = query.date.as_deref() {
        session.set_visible_date(parse_date(date)?);
    }

    let page = SchedulerPage::new(&session, state.sessions.today())?;
    Ok(Html(page.render()?))
}

/// Handler for the health check
pub async fn health_handler() -> impl IntoResponse {
    "OK"
}

/// Send the browser to the provider's sign-in page
pub async fn login_handler(
    Extension(handle): Extension<SessionHandle>,
) -> Result<Redirect, WebError> {
    let state = Uuid::new_v4().to_string();
    let url = handle.provider.sign_in(&state)?;
    handle.session.lock().await.begin_sign_in(state);

    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Handler for the OAuth redirect
pub async fn oauth_callback_handler(
    Extension(handle): Extension<SessionHandle>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, WebError> {
    if let Some(reason) = query.error {
        warn!("Sign in was not completed: {}", reason);
        return Ok(Redirect::to("/"));
    }

    let state = query
        .state
        .ok_or_else(|| WebError::BadRequest("Missing state".to_string()))?;
    let code = query
        .code
        .ok_or_else(|| WebError::BadRequest("Missing code".to_string()))?;

    if !handle.session.lock().await.finish_sign_in(&state) {
        return Err(WebError::BadRequest("Unexpected sign-in state".to_string()));
    }

    // Events are loaded by the session's sign-in listener
    if let Err(e) = handle.provider.complete_sign_in(&code).await {
        error!("Sign in failed: {:?}", e);
    }

    Ok(Redirect::to("/"))
}

/// Sign out and drop everything the session holds
pub async fn logout_handler(Extension(handle): Extension<SessionHandle>) -> Redirect {
    if let Err(e) = handle.provider.sign_out().await {
        error!("Sign out failed: {:?}", e);
    }
    handle.session.lock().await.logout();
    info!("Session logged out");

    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
pub struct SlotForm {
    pub start: String,
    pub end: String,
}

/// Record a clicked or dragged slot range
pub async fn select_slot_handler(
    Extension(handle): Extension<SessionHandle>,
    Form(form): Form<SlotForm>,
) -> Result<Redirect, WebError> {
    let mut session = handle.session.lock().await;
    let tz = session.timezone();

    let localize = |value: &str| {
        NaiveDateTime::parse_from_str(value, SLOT_FORMAT)
            .ok()
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
            .ok_or_else(|| WebError::BadRequest(format!("Invalid slot time: {}", value)))
    };

    let start = localize(&form.start)?;
    let end = localize(&form.end)?;
    if end <= start {
        return Err(WebError::BadRequest("Slot must end after it starts".to_string()));
    }

    session.select_slot(&start, &end);
    Ok(redirect_to_week(start.date_naive()))
}

#[derive(Debug, Deserialize)]
pub struct EventForm {
    pub id: String,
}

/// Record the time range of a clicked event
pub async fn select_event_handler(
    Extension(handle): Extension<SessionHandle>,
    Form(form): Form<EventForm>,
) -> Redirect {
    let mut session = handle.session.lock().await;
    session.select_event(&form.id);
    redirect_to_week(session.visible_date())
}

/// Empty the selection
pub async fn clear_selection_handler(Extension(handle): Extension<SessionHandle>) -> Redirect {
    let mut session = handle.session.lock().await;
    session.clear_selection();
    redirect_to_week(session.visible_date())
}

/// Selection summary as plain text, copied to the clipboard by the page
pub async fn export_handler(Extension(handle): Extension<SessionHandle>) -> impl IntoResponse {
    let text = handle.session.lock().await.export_selection();
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text)
}

#[derive(Debug, Deserialize)]
pub struct NavigateQuery {
    pub direction: Direction,
    pub date: Option<String>,
}

/// Move the visible week
pub async fn navigate_handler(
    State(state): State<AppState>,
    Extension(handle): Extension<SessionHandle>,
    Query(query): Query<NavigateQuery>,
) -> Result<Redirect, WebError> {
    let mut session = handle.session.lock().await;

    if let Some(date) = query.date.as_deref() {
        session.set_visible_date(parse_date(date)?);
    }

    let date = session.navigate(query.direction, state.sessions.today());
    Ok(redirect_to_week(date))
}
