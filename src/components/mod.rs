// Export components
pub mod google_calendar;
pub mod selection;
pub mod session;
pub mod view;

// Re-export the pieces the web layer works with
pub use google_calendar::{CalendarEvent, CalendarProvider, GoogleCalendarHandle, SignInState};
pub use selection::{SelectionEntry, SelectionLedger};
pub use session::{SchedulerSession, SessionStore};
