use chrono::{Datelike, Duration, Local, NaiveDate};

/// Canonical calendar-date rendering used everywhere dates cross an
/// interface boundary.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date in the user's local timezone.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

pub fn in_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}
