//! Input and resolved forms of a geography: the raw token a caller hands in,
//! the optional type hint, and the canonical identifier plus level produced
//! by the resolver.

use crate::geography::error::GeographyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// National sentinel returned for the token `"us"`.
pub const NATIONAL_TOTAL: &str = "TOTAL";
/// National sentinel returned for the tokens `"conus"` and `"total"`.
pub const NATIONAL_CONUS: &str = "CONUS";

/// A raw geography as supplied by the caller.
///
/// Strings may hold a state abbreviation (`"VA"`), a state FIPS code (`"51"`),
/// a county FIPS code (`"01001"`, `"1001"`) or a national alias (`"us"`,
/// `"conus"`, `"total"`). Integers are treated as FIPS codes.
///
/// # Examples
///
/// ```
/// use usdm::GeographyToken;
///
/// assert_eq!(GeographyToken::from("AL").to_string(), "AL");
/// assert_eq!(GeographyToken::from(1001).to_string(), "1001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GeographyToken {
    Text(String),
    Code(i64),
}

impl fmt::Display for GeographyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeographyToken::Text(s) => write!(f, "{}", s),
            GeographyToken::Code(c) => write!(f, "{}", c),
        }
    }
}

impl From<&str> for GeographyToken {
    fn from(value: &str) -> Self {
        GeographyToken::Text(value.to_string())
    }
}

impl From<String> for GeographyToken {
    fn from(value: String) -> Self {
        GeographyToken::Text(value)
    }
}

impl From<&String> for GeographyToken {
    fn from(value: &String) -> Self {
        GeographyToken::Text(value.clone())
    }
}

macro_rules! impl_token_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for GeographyToken {
                fn from(value: $t) -> Self {
                    GeographyToken::Code(i64::from(value))
                }
            }
        )*
    };
}

impl_token_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// One geography, or a list of geographies that must all share a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeographyInput {
    Single(GeographyToken),
    List(Vec<GeographyToken>),
}

impl GeographyInput {
    pub fn tokens(&self) -> Vec<&GeographyToken> {
        match self {
            GeographyInput::Single(token) => vec![token],
            GeographyInput::List(tokens) => tokens.iter().collect(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, GeographyInput::List(_))
    }
}

macro_rules! impl_input_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for GeographyInput {
                fn from(value: $t) -> Self {
                    GeographyInput::Single(value.into())
                }
            }

            impl From<Vec<$t>> for GeographyInput {
                fn from(values: Vec<$t>) -> Self {
                    GeographyInput::List(values.into_iter().map(Into::into).collect())
                }
            }

            impl<const N: usize> From<[$t; N]> for GeographyInput {
                fn from(values: [$t; N]) -> Self {
                    GeographyInput::List(values.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

impl_input_from!(&str, String, i32, i64, u32, GeographyToken);

/// Hint describing how a geography token should be interpreted.
///
/// Only FIPS-style tokens are supported; passing no hint behaves the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeographyType {
    #[default]
    Fips,
}

impl FromStr for GeographyType {
    type Err = GeographyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fips" => Ok(GeographyType::Fips),
            _ => Err(GeographyError::InvalidGeography(
                "geography_type must be None or 'fips'".to_string(),
            )),
        }
    }
}

/// Administrative level of a resolved geography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeographyLevel {
    National,
    State,
    County,
}

impl GeographyLevel {
    /// Path segment of the statistics service serving this level.
    pub(crate) fn statistics_area(&self) -> &'static str {
        match self {
            GeographyLevel::National => "USStatistics/",
            GeographyLevel::State => "StateStatistics/",
            GeographyLevel::County => "CountyStatistics/",
        }
    }
}

impl fmt::Display for GeographyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeographyLevel::National => "national",
            GeographyLevel::State => "state",
            GeographyLevel::County => "county",
        };
        write!(f, "{}", name)
    }
}

/// A canonical geography identifier together with its level.
///
/// `code` is `"TOTAL"` or `"CONUS"` for national geographies, the upper-case
/// two-letter abbreviation for states, and the zero-padded five-digit FIPS
/// code for counties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedGeography {
    pub code: String,
    pub level: GeographyLevel,
}

impl ResolvedGeography {
    pub fn new(code: impl Into<String>, level: GeographyLevel) -> Self {
        Self {
            code: code.into(),
            level,
        }
    }
}

impl fmt::Display for ResolvedGeography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}
