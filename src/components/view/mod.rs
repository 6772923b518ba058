mod style;

pub use style::{event_style, EventStyle, DEFAULT_EVENT_COLOR, SELECTED_EVENT_COLOR};

use crate::components::google_calendar::CalendarEvent;
use crate::components::selection::SelectionLedger;
use crate::config::ViewConfig;
use crate::error::{other_error, AppResult};
use crate::utils::time::{format_date_label, format_time_range, format_week_header, week_bounds};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::Deserialize;

/// Format used for slot bounds posted back by the page
pub const SLOT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Week navigation actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Prev,
    Next,
    Today,
}

/// Sunday and Saturday of the week around `date`, if the whole grid can be laid out.
///
/// The last slot of Saturday may end at midnight, so the following day must exist too.
pub fn displayable_week(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    week_bounds(date).filter(|(_, last)| last.succ_opt().is_some())
}

/// Date shown after navigating from `current`.
///
/// Stays on `current` when the target week cannot be shown.
pub fn navigate(current: NaiveDate, direction: Direction, today: NaiveDate) -> NaiveDate {
    let target = match direction {
        Direction::Prev => current.checked_sub_signed(Duration::weeks(1)),
        Direction::Next => current.checked_add_signed(Duration::weeks(1)),
        Direction::Today => Some(today),
    };

    target
        .filter(|date| displayable_week(*date).is_some())
        .unwrap_or(current)
}

/// An event as drawn in the grid
#[derive(Debug, Clone)]
pub struct EventBlock {
    pub id: String,
    pub title: String,
    pub time_range: String,
    pub style: EventStyle,
}

/// One bookable slot of one day
#[derive(Debug, Clone)]
pub struct SlotCell {
    pub start: String,
    pub end: String,
    pub events: Vec<EventBlock>,
}

/// One row of the grid, shared by all seven days
#[derive(Debug, Clone)]
pub struct SlotRow {
    pub label: String,
    /// First slot of an hour cell
    pub starts_group: bool,
    pub cells: Vec<SlotCell>,
}

/// Header of one day column
#[derive(Debug, Clone)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub label: String,
    pub is_today: bool,
    /// Events of this day that fall outside the visible hours
    pub outside_hours: Vec<EventBlock>,
}

/// The whole week as rendered by the page
#[derive(Debug, Clone)]
pub struct WeekView {
    pub header: String,
    pub visible_date: NaiveDate,
    pub days: Vec<DayColumn>,
    pub rows: Vec<SlotRow>,
}

impl WeekView {
    /// Lay out the week containing `visible_date`
    pub fn build<Tz: TimeZone>(
        visible_date: NaiveDate,
        today: NaiveDate,
        events: &[CalendarEvent],
        ledger: &SelectionLedger,
        tz: &Tz,
        view: &ViewConfig,
    ) -> AppResult<Self> {
        let (first, last) = displayable_week(visible_date)
            .ok_or_else(|| other_error(&format!("Week of {} is out of range", visible_date)))?;
        let dates: Vec<NaiveDate> = first.iter_days().take(7).collect();

        let mut days: Vec<DayColumn> = dates
            .iter()
            .map(|date| DayColumn {
                date: *date,
                label: format_date_label(date),
                is_today: *date == today,
                outside_hours: Vec::new(),
            })
            .collect();

        let mut rows = slot_rows(&dates, view);

        for event in events {
            let start = event.start.with_timezone(tz);
            let end = event.end.with_timezone(tz);
            let start_date = start.date_naive();

            let Some(day_index) = dates.iter().position(|d| *d == start_date) else {
                continue;
            };

            let block = EventBlock {
                id: event.id.clone(),
                title: event.title.clone(),
                time_range: format_time_range(&start, &end),
                style: event_style(ledger, &start, &end),
            };

            match slot_index(start.hour() * 60 + start.minute(), view) {
                Some(row) => rows[row].cells[day_index].events.push(block),
                None => days[day_index].outside_hours.push(block),
            }
        }

        Ok(Self {
            header: format_week_header(&first, &last),
            visible_date,
            days,
            rows,
        })
    }
}

fn slot_rows(dates: &[NaiveDate], view: &ViewConfig) -> Vec<SlotRow> {
    let slots_per_day = (view.max_hour - view.min_hour) * 60 / view.step_minutes;

    (0..slots_per_day)
        .map(|index| {
            let offset = view.min_hour * 60 + index * view.step_minutes;
            let cells = dates
                .iter()
                .map(|date| {
                    let start = slot_time(*date, offset);
                    let end = start + Duration::minutes(view.step_minutes as i64);
                    SlotCell {
                        start: start.format(SLOT_FORMAT).to_string(),
                        end: end.format(SLOT_FORMAT).to_string(),
                        events: Vec::new(),
                    }
                })
                .collect();

            SlotRow {
                label: format!("{:02}:{:02}", offset / 60, offset % 60),
                starts_group: index % view.timeslots == 0,
                cells,
            }
        })
        .collect()
}

fn slot_time(date: NaiveDate, minutes: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::minutes(minutes as i64)
}

/// Row holding a start time given in minutes since midnight
fn slot_index(minutes: u32, view: &ViewConfig) -> Option<usize> {
    let first = view.min_hour * 60;
    let last = view.max_hour * 60;
    if minutes < first || minutes >= last {
        return None;
    }
    Some(((minutes - first) / view.step_minutes) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::Asia::Tokyo;

    fn event(id: &str, start: (u32, u32, u32), end: (u32, u32, u32)) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            title: format!("Event {}", id),
            start: Tokyo
                .with_ymd_and_hms(2023, 6, start.0, start.1, start.2, 0)
                .unwrap()
                .with_timezone(&Utc),
            end: Tokyo
                .with_ymd_and_hms(2023, 6, end.0, end.1, end.2, 0)
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, day).unwrap()
    }

    #[test]
    fn test_grid_shape() {
        let view = WeekView::build(
            june(1),
            june(1),
            &[],
            &SelectionLedger::new(),
            &Tokyo,
            &ViewConfig::default(),
        )
        .unwrap();

        assert_eq!(view.header, "5月28日~6月3日");
        assert_eq!(view.days.len(), 7);
        assert_eq!(view.days[0].label, "5月28日(日)");
        assert!(view.days[4].is_today);

        // 07:00 to 23:00 in 30 minute steps
        assert_eq!(view.rows.len(), 32);
        assert_eq!(view.rows[0].label, "07:00");
        assert!(view.rows[0].starts_group);
        assert!(!view.rows[1].starts_group);
        assert_eq!(view.rows[31].label, "22:30");

        let last = &view.rows[31].cells[6];
        assert_eq!(last.start, "2023-06-03T22:30");
        assert_eq!(last.end, "2023-06-03T23:00");
    }

    #[test]
    fn test_events_are_placed_by_start() {
        let events = vec![
            event("morning", (1, 10, 0), (1, 10, 30)),
            event("odd", (2, 10, 15), (2, 11, 0)),
            event("early", (3, 5, 0), (3, 6, 0)),
            event("next-week", (5, 10, 0), (5, 11, 0)),
        ];

        let view = WeekView::build(
            june(1),
            june(1),
            &events,
            &SelectionLedger::new(),
            &Tokyo,
            &ViewConfig::default(),
        )
        .unwrap();

        // 10:00 is the seventh row; Thursday is column 4
        let block = &view.rows[6].cells[4].events[0];
        assert_eq!(block.id, "morning");
        assert_eq!(block.time_range, "10:00-10:30");
        assert_eq!(block.style.background_color, DEFAULT_EVENT_COLOR);

        assert_eq!(view.rows[6].cells[5].events[0].id, "odd");
        assert_eq!(view.days[6].outside_hours[0].id, "early");

        let placed: usize = view
            .rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .map(|cell| cell.events.len())
            .sum();
        assert_eq!(placed, 2);
    }

    #[test]
    fn test_selected_event_is_greyed_out() {
        let events = vec![event("morning", (1, 10, 0), (1, 10, 30))];
        let mut ledger = SelectionLedger::new();
        ledger.record_selection("6月1日(木)", "10:00-10:30");

        let view = WeekView::build(
            june(1),
            june(1),
            &events,
            &ledger,
            &Tokyo,
            &ViewConfig::default(),
        )
        .unwrap();
        assert!(view.rows[6].cells[4].events[0].style.is_selected());
    }

    #[test]
    fn test_navigate() {
        assert_eq!(navigate(june(14), Direction::Prev, june(1)), june(7));
        assert_eq!(navigate(june(14), Direction::Next, june(1)), june(21));
        assert_eq!(navigate(june(14), Direction::Today, june(1)), june(1));
    }

    #[test]
    fn test_navigate_stops_at_the_last_representable_week() {
        let last = NaiveDate::MAX;
        assert_eq!(navigate(last, Direction::Next, june(1)), last);

        // The last date is a Monday, so the last full week ends three days before it
        let edge = NaiveDate::MAX - Duration::days(3);
        assert!(displayable_week(edge).is_some());
        assert_eq!(navigate(edge, Direction::Next, june(1)), edge);
        assert_eq!(navigate(edge, Direction::Prev, june(1)), edge - Duration::days(7));
    }

    #[test]
    fn test_unrepresentable_week_is_an_error() {
        let result = WeekView::build(
            NaiveDate::MAX,
            june(1),
            &[],
            &SelectionLedger::new(),
            &Tokyo,
            &ViewConfig::default(),
        );
        assert!(result.is_err());
    }
}
