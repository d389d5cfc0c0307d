//! Classification and normalization of caller-supplied time periods.

use crate::error::UsdmError;
use crate::types::time_period::{DateKind, DatePeriod, PeriodValue, TimePeriod};
use crate::utils::{parse_date, parse_slash_date, DAY_FIRST_FORMAT, US_DATE_FORMAT, YEAR_FIRST_FORMAT};

const INVALID_TIME_PERIOD: &str = "The values entered for the time_period parameter are not valid. Please enter a list of years, a list of two dates (i.e. start and end dates)";

fn is_year(value: i64) -> bool {
    (1000..=9999).contains(&value)
}

/// Classifies a time period as years, dates, a mix of both, or invalid.
///
/// Four-digit integers count as years. Strings count as dates when, after
/// replacing `-` with `/`, they read as `YYYY/MM/DD` or `MM/DD/YYYY`. A string
/// that reads as neither, or an integer that is not a year, makes the whole
/// period invalid.
///
/// # Examples
///
/// ```
/// use usdm::{classify, DateKind, PeriodValue, TimePeriod};
///
/// assert_eq!(classify(&TimePeriod::from(vec![2020, 2021, 2022])), DateKind::Year);
/// assert_eq!(classify(&TimePeriod::from(["2020-01-01", "2022/12/31"])), DateKind::Date);
/// assert_eq!(
///     classify(&TimePeriod::from(vec![PeriodValue::from("2020-01-01"), PeriodValue::from(2022)])),
///     DateKind::Mixed
/// );
/// assert_eq!(classify(&TimePeriod::from("bogus")), DateKind::Invalid);
/// ```
pub fn classify(period: &TimePeriod) -> DateKind {
    let values = period.values();
    if values.is_empty() {
        return DateKind::Invalid;
    }

    let mut years = 0;
    let mut dates = 0;
    for value in &values {
        match value {
            PeriodValue::Int(v) if is_year(*v) => years += 1,
            PeriodValue::Text(s) => {
                if parse_slash_date(&s.replace('-', "/")).is_some() {
                    dates += 1;
                } else {
                    return DateKind::Invalid;
                }
            }
            PeriodValue::Int(_) => return DateKind::Invalid,
        }
    }

    if years == values.len() {
        DateKind::Year
    } else if dates == values.len() {
        DateKind::Date
    } else if years > 0 && dates > 0 {
        DateKind::Mixed
    } else {
        DateKind::Invalid
    }
}

/// Rewrites a bound given as `DD/MM/YYYY` or `YYYY/MM/DD` into `MM/DD/YYYY`.
///
/// Both readings are tried in turn, so a value that is valid day-first is
/// reinterpreted as such even when it was meant month-first.
fn normalize_bound(value: &str) -> String {
    let mut value = value.replace('-', "/");
    if let Some(date) = parse_date(&value, DAY_FIRST_FORMAT) {
        value = date.format(US_DATE_FORMAT).to_string();
    }
    if let Some(date) = parse_date(&value, YEAR_FIRST_FORMAT) {
        value = date.format(US_DATE_FORMAT).to_string();
    }
    value
}

fn invalid() -> UsdmError {
    UsdmError::InvalidTimePeriod(INVALID_TIME_PERIOD.to_string())
}

/// Resolves a time period into a [`DatePeriod`].
///
/// * Years become `01/01/<earliest>` through `12/31/<latest>`.
/// * Two date strings become a start/end range in `MM/DD/YYYY` form.
/// * A single date string is slash-normalized and kept as a single date.
///
/// # Errors
///
/// Returns [`UsdmError::InvalidTimePeriod`] for mixed or invalid periods, for
/// lists of more than two dates, and for ranges that end before they start.
///
/// # Examples
///
/// ```
/// use usdm::{resolve_dates, TimePeriod};
///
/// assert_eq!(resolve_dates(&TimePeriod::from(2020))?, ["01/01/2020", "12/31/2020"]);
/// assert_eq!(resolve_dates(&TimePeriod::from(vec![2020, 2021, 2022]))?, ["01/01/2020", "12/31/2022"]);
/// # Ok::<(), usdm::UsdmError>(())
/// ```
pub fn resolve_dates(period: &TimePeriod) -> Result<DatePeriod, UsdmError> {
    match classify(period) {
        DateKind::Year => {
            let years: Vec<i64> = period
                .values()
                .into_iter()
                .filter_map(|v| match v {
                    PeriodValue::Int(y) => Some(*y),
                    PeriodValue::Text(_) => None,
                })
                .collect();
            let (min, max) = match (years.iter().min(), years.iter().max()) {
                (Some(min), Some(max)) => (*min, *max),
                _ => return Err(invalid()),
            };
            Ok(DatePeriod::Range {
                start: format!("01/01/{}", min),
                end: format!("12/31/{}", max),
            })
        }
        DateKind::Date => {
            let texts: Vec<&str> = period
                .values()
                .into_iter()
                .filter_map(|v| match v {
                    PeriodValue::Text(s) => Some(s.as_str()),
                    PeriodValue::Int(_) => None,
                })
                .collect();
            match texts.as_slice() {
                [single] => Ok(DatePeriod::Single(single.replace('-', "/"))),
                [start, end] => {
                    let start = normalize_bound(start);
                    let end = normalize_bound(end);
                    check_order(&start, &end)?;
                    Ok(DatePeriod::Range { start, end })
                }
                _ => Err(invalid()),
            }
        }
        DateKind::Mixed | DateKind::Invalid => Err(invalid()),
    }
}

fn check_order(start: &str, end: &str) -> Result<(), UsdmError> {
    let parsed = (
        parse_date(start, US_DATE_FORMAT),
        parse_date(end, US_DATE_FORMAT),
    );
    match parsed {
        (Some(s), Some(e)) if s > e => Err(UsdmError::InvalidTimePeriod(format!(
            "The start date {} is after the end date {}",
            start, end
        ))),
        _ => Ok(()),
    }
}
