use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};

pub(crate) const US_DATE_FORMAT: &str = "%m/%d/%Y";
pub(crate) const YEAR_FIRST_FORMAT: &str = "%Y/%m/%d";
pub(crate) const DAY_FIRST_FORMAT: &str = "%d/%m/%Y";

/// Parses a slash-separated date with `format`. The year must be written with
/// four digits, which chrono's `%Y` alone does not enforce.
pub(crate) fn parse_date(value: &str, format: &str) -> Option<NaiveDate> {
    let year = if format.starts_with("%Y") {
        value.split('/').next()
    } else {
        value.rsplit('/').next()
    };
    let four_digits = year.is_some_and(|y| y.len() == 4 && y.bytes().all(|b| b.is_ascii_digit()));
    if !four_digits {
        return None;
    }
    NaiveDate::parse_from_str(value, format).ok()
}

/// Reads a slash-separated date as `YYYY/MM/DD`, falling back to `MM/DD/YYYY`.
pub(crate) fn parse_slash_date(value: &str) -> Option<NaiveDate> {
    parse_date(value, YEAR_FIRST_FORMAT).or_else(|| parse_date(value, US_DATE_FORMAT))
}

/// Parses the date portion of the timestamps returned by the data services.
pub(crate) fn parse_service_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
        .or_else(|| parse_date(value, US_DATE_FORMAT))
}

pub(crate) fn current_year() -> i32 {
    Utc::now().year()
}
