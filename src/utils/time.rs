use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Weekday};

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    // 24:00 is accepted as the end of the visible day
    if hour > 24 || minute > 59 || (hour == 24 && minute != 0) {
        return None;
    }
    Some((hour, minute))
}

/// Kanji used for the day of the week in day labels
pub fn weekday_kanji(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "月",
        Weekday::Tue => "火",
        Weekday::Wed => "水",
        Weekday::Thu => "木",
        Weekday::Fri => "金",
        Weekday::Sat => "土",
        Weekday::Sun => "日",
    }
}

/// Format a date as `M月D日`, without zero padding
pub fn format_month_day(date: &NaiveDate) -> String {
    format!("{}月{}日", date.month(), date.day())
}

/// Day label for a calendar date, e.g. `6月1日(木)`
pub fn format_date_label(date: &NaiveDate) -> String {
    format!("{}({})", format_month_day(date), weekday_kanji(date.weekday()))
}

/// Day label for a timestamp in its own timezone, e.g. `6月1日(木)`
pub fn format_day_label<Tz: TimeZone>(ts: &DateTime<Tz>) -> String {
    format_date_label(&ts.date_naive())
}

/// 24-hour, zero-padded `HH:MM`
pub fn format_time_label<Tz: TimeZone>(ts: &DateTime<Tz>) -> String {
    format!("{:02}:{:02}", ts.hour(), ts.minute())
}

/// Time range label, e.g. `10:00-10:30`
pub fn format_time_range<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> String {
    format!("{}-{}", format_time_label(start), format_time_label(end))
}

/// Header shown above the week grid, e.g. `5月28日~6月3日`
pub fn format_week_header(start: &NaiveDate, end: &NaiveDate) -> String {
    format!("{}~{}", format_month_day(start), format_month_day(end))
}

/// First (Sunday) and last (Saturday) day of the week containing `date`.
///
/// `None` when the week runs past the range chrono can represent.
pub fn week_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let offset = Duration::days(date.weekday().num_days_from_sunday() as i64);
    let sunday = date.checked_sub_signed(offset)?;
    let saturday = sunday.checked_add_signed(Duration::days(6))?;
    Some((sunday, saturday))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::Asia::Tokyo;

    #[test]
    fn test_parse_time() {
        // Valid cases
        assert_eq!(parse_time("00:00"), Some((0, 0)));
        assert_eq!(parse_time("12:30"), Some((12, 30)));
        assert_eq!(parse_time("23:59"), Some((23, 59)));
        assert_eq!(parse_time("24:00"), Some((24, 0)));

        // Invalid cases
        assert_eq!(parse_time("24:30"), None);
        assert_eq!(parse_time("12:60"), None); // Minute out of range
        assert_eq!(parse_time("12:30:45"), None); // Too many parts
        assert_eq!(parse_time("12"), None); // Too few parts
        assert_eq!(parse_time("12:ab"), None); // Invalid minute
        assert_eq!(parse_time("ab:30"), None); // Invalid hour
    }

    #[test]
    fn test_weekday_kanji_mapping() {
        let expected = [
            (Weekday::Mon, "月"),
            (Weekday::Tue, "火"),
            (Weekday::Wed, "水"),
            (Weekday::Thu, "木"),
            (Weekday::Fri, "金"),
            (Weekday::Sat, "土"),
            (Weekday::Sun, "日"),
        ];
        for (weekday, kanji) in expected {
            assert_eq!(weekday_kanji(weekday), kanji);
        }
    }

    #[test]
    fn test_format_day_label() {
        // Thursday, 2023-06-01
        let ts = Tokyo.with_ymd_and_hms(2023, 6, 1, 10, 0, 0).unwrap();
        assert_eq!(format_day_label(&ts), "6月1日(木)");

        // Two-digit month and day are not padded either way
        let ts = Tokyo.with_ymd_and_hms(2023, 12, 24, 9, 5, 0).unwrap();
        assert_eq!(format_day_label(&ts), "12月24日(日)");
    }

    #[test]
    fn test_sunday_label_ends_with_kanji_for_sunday() {
        // Sunday, 2023-01-01
        let ts = Tokyo.with_ymd_and_hms(2023, 1, 1, 15, 0, 0).unwrap();
        assert!(format_day_label(&ts).ends_with("(日)"));
    }

    #[test]
    fn test_day_label_uses_timestamp_timezone() {
        // 2023-06-01 20:00 UTC is already Friday morning in Tokyo
        let utc = Utc.with_ymd_and_hms(2023, 6, 1, 20, 0, 0).unwrap();
        assert_eq!(format_day_label(&utc), "6月1日(木)");
        assert_eq!(format_day_label(&utc.with_timezone(&Tokyo)), "6月2日(金)");
    }

    #[test]
    fn test_format_time_labels() {
        let start = Tokyo.with_ymd_and_hms(2023, 6, 1, 7, 0, 0).unwrap();
        let end = Tokyo.with_ymd_and_hms(2023, 6, 1, 7, 30, 0).unwrap();
        assert_eq!(format_time_label(&start), "07:00");
        assert_eq!(format_time_range(&start, &end), "07:00-07:30");

        let late = Tokyo.with_ymd_and_hms(2023, 6, 1, 22, 5, 0).unwrap();
        assert_eq!(format_time_label(&late), "22:05");
    }

    #[test]
    fn test_week_bounds_start_on_sunday() {
        // Thursday, 2023-06-01
        let date = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let (start, end) = week_bounds(date).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 5, 28).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2023, 6, 3).unwrap());

        // A Sunday is the first day of its own week
        let sunday = NaiveDate::from_ymd_opt(2023, 5, 28).unwrap();
        assert_eq!(week_bounds(sunday).unwrap().0, sunday);
    }

    #[test]
    fn test_week_bounds_at_the_edge_of_the_calendar() {
        assert_eq!(week_bounds(NaiveDate::MAX), None);
    }

    #[test]
    fn test_format_week_header() {
        let (start, end) = week_bounds(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()).unwrap();
        assert_eq!(format_week_header(&start, &end), "5月28日~6月3日");
    }
}
