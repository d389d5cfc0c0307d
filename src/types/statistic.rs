//! Statistic selections and the endpoint each one maps to.

use crate::error::UsdmError;
use std::fmt;
use std::str::FromStr;

/// Endpoint family used for comprehensive statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointFamily {
    /// Cumulative coverage per drought category (`GetDroughtSeverityStatisticsBy*`).
    DroughtSeverity,
    /// Coverage within an explicit threshold window (`GetBasicStatisticsBy*`).
    Basic,
}

impl EndpointFamily {
    fn prefix(&self) -> &'static str {
        match self {
            EndpointFamily::DroughtSeverity => "DroughtSeverityStatisticsBy",
            EndpointFamily::Basic => "BasicStatisticsBy",
        }
    }
}

/// A comprehensive statistic offered by the `*Statistics/` services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompStatistic {
    Area,
    AreaPercent,
    Population,
    PopulationPercent,
    /// Drought Severity and Coverage Index. Served by its own endpoint.
    Dsci,
}

impl CompStatistic {
    pub const ALL: [CompStatistic; 5] = [
        CompStatistic::Area,
        CompStatistic::AreaPercent,
        CompStatistic::Population,
        CompStatistic::PopulationPercent,
        CompStatistic::Dsci,
    ];

    /// Suffix appended to relabeled `none`/`d0`..`d4` columns.
    pub fn label(&self) -> &'static str {
        match self {
            CompStatistic::Area => "Area",
            CompStatistic::AreaPercent => "AreaPercent",
            CompStatistic::Population => "Population",
            CompStatistic::PopulationPercent => "PopulationPercent",
            CompStatistic::Dsci => "DSCI",
        }
    }

    /// Endpoint name, e.g. `GetDroughtSeverityStatisticsByAreaPercent` or `GetDSCI`.
    pub fn endpoint(&self, family: EndpointFamily) -> String {
        match self {
            CompStatistic::Dsci => "GetDSCI".to_string(),
            other => format!("Get{}{}", family.prefix(), other.label()),
        }
    }
}

impl FromStr for CompStatistic {
    type Err = UsdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "area" => Ok(CompStatistic::Area),
            "areapercent" => Ok(CompStatistic::AreaPercent),
            "population" => Ok(CompStatistic::Population),
            "populationpercent" => Ok(CompStatistic::PopulationPercent),
            "dsci" => Ok(CompStatistic::Dsci),
            _ => Err(UsdmError::InvalidArgument(format!(
                "Unknown statistic '{}'. Expected one of Area, AreaPercent, Population, PopulationPercent, DSCI",
                s
            ))),
        }
    }
}

impl fmt::Display for CompStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Kind of weeks-in-drought statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeeksStatistic {
    Consecutive,
    NonConsecutive,
}

impl WeeksStatistic {
    pub const ALL: [WeeksStatistic; 2] = [WeeksStatistic::Consecutive, WeeksStatistic::NonConsecutive];

    pub fn endpoint(&self) -> &'static str {
        match self {
            WeeksStatistic::Consecutive => "GetConsecutiveWeeksCounty",
            WeeksStatistic::NonConsecutive => "GetNonConsecutiveStatisticsCounty",
        }
    }
}

impl FromStr for WeeksStatistic {
    type Err = UsdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "consecutive" => Ok(WeeksStatistic::Consecutive),
            "nonconsecutive" => Ok(WeeksStatistic::NonConsecutive),
            _ => Err(UsdmError::InvalidArgument(format!(
                "Unknown statistic '{}'. Expected 'consecutive' or 'nonconsecutive'",
                s
            ))),
        }
    }
}

impl fmt::Display for WeeksStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeeksStatistic::Consecutive => "consecutive",
            WeeksStatistic::NonConsecutive => "nonconsecutive",
        };
        write!(f, "{}", name)
    }
}

/// Highest drought category (D4, exceptional drought).
pub const MAX_DROUGHT_LEVEL: u8 = 4;

pub(crate) fn all_drought_levels() -> Vec<u8> {
    (0..=MAX_DROUGHT_LEVEL).collect()
}

pub(crate) fn validate_drought_levels(levels: &[u8]) -> Result<(), UsdmError> {
    match levels.iter().find(|&&level| level > MAX_DROUGHT_LEVEL) {
        Some(level) => Err(UsdmError::InvalidArgument(format!(
            "drought_threshold must be a list of integers between 0 and 4, got {}",
            level
        ))),
        None => Ok(()),
    }
}
