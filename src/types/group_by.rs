use crate::error::UsdmError;
use std::fmt;
use std::str::FromStr;

pub(crate) const INVALID_GROUP_BY: &str = "group_by must be None, 'county', or 'state'";
pub(crate) const STATE_LIST_GROUP_BY: &str =
    "When providing a list of states, group_by must be None or 'county'";
pub(crate) const STATE_GROUP_BY_LEVEL: &str =
    "group_by='state' is only valid with national geography";
pub(crate) const COUNTY_GROUP_BY_LEVEL: &str =
    "group_by='county' requires state-level or national geography";

/// Fan-out mode for statistics requests.
///
/// * `County`: one request set per county of the geography (state or national).
/// * `State`: one request set per state (national geography only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GroupBy {
    #[default]
    None,
    County,
    State,
}

impl FromStr for GroupBy {
    type Err = UsdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(GroupBy::None),
            "county" => Ok(GroupBy::County),
            "state" => Ok(GroupBy::State),
            _ => Err(UsdmError::InvalidGroupBy(INVALID_GROUP_BY.to_string())),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupBy::None => "none",
            GroupBy::County => "county",
            GroupBy::State => "state",
        };
        write!(f, "{}", name)
    }
}
