use crate::components::selection::SelectionLedger;
use crate::utils::time::{format_day_label, format_time_range};
use chrono::{DateTime, TimeZone};

pub const DEFAULT_EVENT_COLOR: &str = "#3174ad";
pub const SELECTED_EVENT_COLOR: &str = "#D3D3D3";

/// Inline style for one event block
#[derive(Debug, Clone, PartialEq)]
pub struct EventStyle {
    pub background_color: &'static str,
    pub border_radius: &'static str,
    pub opacity: f32,
    pub color: &'static str,
    pub border: &'static str,
    pub display: &'static str,
}

impl EventStyle {
    pub fn new(selected: bool) -> Self {
        Self {
            background_color: if selected {
                SELECTED_EVENT_COLOR
            } else {
                DEFAULT_EVENT_COLOR
            },
            border_radius: "0px",
            opacity: 0.8,
            color: "white",
            border: "0px",
            display: "block",
        }
    }

    pub fn is_selected(&self) -> bool {
        self.background_color == SELECTED_EVENT_COLOR
    }

    /// Render as a `style` attribute value
    pub fn to_css(&self) -> String {
        format!(
            "background-color: {}; border-radius: {}; opacity: {}; color: {}; border: {}; display: {};",
            self.background_color,
            self.border_radius,
            self.opacity,
            self.color,
            self.border,
            self.display
        )
    }
}

/// Style hook: events whose (day, time range) is already in the ledger are greyed out
pub fn event_style<Tz: TimeZone>(
    ledger: &SelectionLedger,
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
) -> EventStyle {
    let selected = ledger.contains(&format_day_label(start), &format_time_range(start, end));
    EventStyle::new(selected)
}
