mod actor;
mod handle;
pub mod models;
mod provider;
pub mod token;

pub use handle::GoogleCalendarHandle;
pub use models::{CalendarEvent, SignInState};
pub use provider::CalendarProvider;
