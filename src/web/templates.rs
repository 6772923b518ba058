use crate::components::session::SchedulerSession;
use crate::components::view::WeekView;
use crate::error::AppResult;
use askama::Template;
use chrono::NaiveDate;
use rust_i18n::t;

/// UI strings for the current locale
pub struct Labels {
    pub title: String,
    pub login: String,
    pub logout: String,
    pub delete: String,
    pub copy_schedule: String,
    pub copied: String,
    pub prev_week: String,
    pub today: String,
    pub next_week: String,
    pub outside_hours: String,
}

impl Labels {
    pub fn current() -> Self {
        Self {
            title: t!("app_title").to_string(),
            login: t!("login").to_string(),
            logout: t!("logout").to_string(),
            delete: t!("delete").to_string(),
            copy_schedule: t!("copy_schedule").to_string(),
            copied: t!("copied").to_string(),
            prev_week: t!("prev_week").to_string(),
            today: t!("today").to_string(),
            next_week: t!("next_week").to_string(),
            outside_hours: t!("outside_hours").to_string(),
        }
    }
}

/// The single scheduler page
#[derive(Template)]
#[template(path = "scheduler.html")]
pub struct SchedulerPage {
    pub labels: Labels,
    pub greeting: String,
    pub signed_in: bool,
    pub week: WeekView,
    pub summary: String,
}

impl SchedulerPage {
    pub fn new(session: &SchedulerSession, today: NaiveDate) -> AppResult<Self> {
        Ok(Self {
            labels: Labels::current(),
            greeting: session.greeting(),
            signed_in: session.is_signed_in(),
            week: session.week_view(today)?,
            summary: session.export_selection(),
        })
    }
}
