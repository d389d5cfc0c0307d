use std::fmt;

/// One element of a time period: a year or a date string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PeriodValue {
    Int(i64),
    Text(String),
}

impl From<&str> for PeriodValue {
    fn from(value: &str) -> Self {
        PeriodValue::Text(value.to_string())
    }
}

impl From<String> for PeriodValue {
    fn from(value: String) -> Self {
        PeriodValue::Text(value)
    }
}

impl From<i32> for PeriodValue {
    fn from(value: i32) -> Self {
        PeriodValue::Int(i64::from(value))
    }
}

impl From<i64> for PeriodValue {
    fn from(value: i64) -> Self {
        PeriodValue::Int(value)
    }
}

/// A time period as supplied by the caller: a single value or a list.
///
/// # Examples
///
/// ```
/// use usdm::{TimePeriod, PeriodValue};
///
/// let year = TimePeriod::from(2023);
/// let range = TimePeriod::from(["2020-01-01", "2022-12-31"]);
/// let mixed = TimePeriod::from(vec![PeriodValue::from("2020-01-01"), PeriodValue::from(2022)]);
/// # let _ = (year, range, mixed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimePeriod {
    Single(PeriodValue),
    List(Vec<PeriodValue>),
}

impl TimePeriod {
    pub fn values(&self) -> Vec<&PeriodValue> {
        match self {
            TimePeriod::Single(v) => vec![v],
            TimePeriod::List(values) => values.iter().collect(),
        }
    }
}

macro_rules! impl_period_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for TimePeriod {
                fn from(value: $t) -> Self {
                    TimePeriod::Single(value.into())
                }
            }

            impl From<Vec<$t>> for TimePeriod {
                fn from(values: Vec<$t>) -> Self {
                    TimePeriod::List(values.into_iter().map(Into::into).collect())
                }
            }

            impl<const N: usize> From<[$t; N]> for TimePeriod {
                fn from(values: [$t; N]) -> Self {
                    TimePeriod::List(values.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

impl_period_from!(&str, String, i32, i64, PeriodValue);

/// Classification of a [`TimePeriod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateKind {
    Year,
    Date,
    Mixed,
    Invalid,
}

impl fmt::Display for DateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DateKind::Year => "year",
            DateKind::Date => "date",
            DateKind::Mixed => "mixed",
            DateKind::Invalid => "invalid",
        };
        write!(f, "{}", name)
    }
}

/// A resolved time period.
///
/// Ranges hold `MM/DD/YYYY` strings. A single date keeps the slash-normalized
/// form it was given in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DatePeriod {
    Range { start: String, end: String },
    Single(String),
}

impl DatePeriod {
    /// The period as a list: `[start, end]` or `[date]`.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            DatePeriod::Range { start, end } => vec![start.clone(), end.clone()],
            DatePeriod::Single(date) => vec![date.clone()],
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, DatePeriod::Single(_))
    }

    /// Start and end dates as sent to the statistics service.
    ///
    /// A single date is used for both bounds, in `MM/DD/YYYY` form when it
    /// can be read as a date.
    pub fn query_bounds(&self) -> (String, String) {
        match self {
            DatePeriod::Range { start, end } => (start.clone(), end.clone()),
            DatePeriod::Single(date) => {
                let date = crate::utils::parse_slash_date(date)
                    .map(|d| d.format(crate::utils::US_DATE_FORMAT).to_string())
                    .unwrap_or_else(|| date.clone());
                (date.clone(), date)
            }
        }
    }
}

impl PartialEq<[&str]> for DatePeriod {
    fn eq(&self, other: &[&str]) -> bool {
        self.as_list().iter().map(String::as_str).eq(other.iter().copied())
    }
}

impl<const N: usize> PartialEq<[&str; N]> for DatePeriod {
    fn eq(&self, other: &[&str; N]) -> bool {
        self == &other[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_query_bounds_reformats_year_first() {
        let period = DatePeriod::Single("2023/12/31".to_string());
        assert_eq!(
            period.query_bounds(),
            ("12/31/2023".to_string(), "12/31/2023".to_string())
        );
        assert_eq!(period.as_list(), vec!["2023/12/31".to_string()]);
    }

    #[test]
    fn test_range_compares_with_str_array() {
        let period = DatePeriod::Range {
            start: "01/01/2020".to_string(),
            end: "12/31/2020".to_string(),
        };
        assert_eq!(period, ["01/01/2020", "12/31/2020"]);
    }
}
