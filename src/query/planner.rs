use crate::error::UsdmError;
use crate::geography::fips_table::FipsTable;
use crate::query::fan_out::{FanOutUnit, GeoIdentifiers};
use crate::types::geography::{GeographyLevel, ResolvedGeography};
use crate::types::statistic::{CompStatistic, EndpointFamily, WeeksStatistic};
use crate::types::time_period::DatePeriod;

const WEEKS_AREA: &str = "ConsecutiveNonConsecutiveStatistics/";
const STATISTICS_TYPE: u8 = 1;
const CATEGORY_FIELDS: [&str; 6] = ["none", "d0", "d1", "d2", "d3", "d4"];

/// One planned request and the column renames applied to its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedQuery {
    pub url: String,
    /// `(raw field, output column)` pairs; fields absent from a response are skipped.
    pub relabel: Vec<(String, String)>,
}

/// The requests for one fan-out geography.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryGroup {
    pub identifiers: Option<GeoIdentifiers>,
    pub queries: Vec<PlannedQuery>,
}

/// Statistic selection for a comprehensive-statistics retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompStatsRequest {
    pub stats: Vec<CompStatistic>,
    pub thresholds: Vec<u8>,
    /// Inclusive drought-category window; switches to the basic-statistics endpoints.
    pub threshold_range: Option<(u8, u8)>,
}

fn comp_relabel(stat: CompStatistic) -> Vec<(String, String)> {
    let mut rules: Vec<(String, String)> = CATEGORY_FIELDS
        .iter()
        .map(|field| {
            (
                field.to_string(),
                format!("{}_{}", field.to_uppercase(), stat.label()),
            )
        })
        .collect();
    rules.push(("validStart".to_string(), "mapStartDate".to_string()));
    rules.push(("validEnd".to_string(), "mapEndDate".to_string()));
    rules
}

fn weeks_relabel(level: u8) -> Vec<(String, String)> {
    [
        ("nonConsecutiveWeeks", "NonConsecutiveWeeks"),
        ("consecutiveWeeks", "ConsecutiveWeeks"),
        ("startDate", "ConsecutiveWeeksStartDate"),
        ("endDate", "ConsecutiveWeeksEndDate"),
    ]
    .iter()
    .map(|(field, suffix)| (field.to_string(), format!("D{}_{}", level, suffix)))
    .collect()
}

/// Area-of-interest parameter: states are addressed by numeric code.
fn area_of_interest(geography: &ResolvedGeography, table: &FipsTable) -> Result<String, UsdmError> {
    match geography.level {
        GeographyLevel::State => Ok(table.convert_state_code(&geography.code)?),
        GeographyLevel::National | GeographyLevel::County => Ok(geography.code.clone()),
    }
}

/// Plans the comprehensive-statistics requests: one per statistic for every unit.
///
/// # Errors
///
/// Returns [`UsdmError::InvalidArgument`] when no statistic is selected or a
/// threshold range is given without a drought threshold, and a conversion
/// error if a state has no numeric code.
pub fn plan_comp_stats(
    units: &[FanOutUnit],
    request: &CompStatsRequest,
    period: &DatePeriod,
    base_url: &str,
    table: &FipsTable,
) -> Result<Vec<QueryGroup>, UsdmError> {
    if request.stats.is_empty() {
        return Err(UsdmError::InvalidArgument(
            "stat must contain at least one statistic".to_string(),
        ));
    }

    let (family, threshold_query) = match request.threshold_range {
        Some((a, b)) => {
            let dx = request.thresholds.first().ok_or_else(|| {
                UsdmError::InvalidArgument(
                    "threshold_range requires at least one drought_threshold".to_string(),
                )
            })?;
            (
                EndpointFamily::Basic,
                format!(
                    "&dx={}&DxLevelThresholdFrom={}&DxLevelThresholdTo={}",
                    dx,
                    a.min(b),
                    a.max(b)
                ),
            )
        }
        None => (EndpointFamily::DroughtSeverity, String::new()),
    };
    let (start, end) = period.query_bounds();

    units
        .iter()
        .map(|unit| {
            let area = unit.geography.level.statistics_area();
            let aoi = area_of_interest(&unit.geography, table)?;
            let queries = request
                .stats
                .iter()
                .map(|stat| PlannedQuery {
                    url: format!(
                        "{}{}{}?aoi={}{}&startdate={}&enddate={}&statisticsType={}",
                        base_url,
                        area,
                        stat.endpoint(family),
                        aoi,
                        threshold_query,
                        start,
                        end,
                        STATISTICS_TYPE
                    ),
                    relabel: comp_relabel(*stat),
                })
                .collect();
            Ok(QueryGroup {
                identifiers: unit.identifiers.clone(),
                queries,
            })
        })
        .collect()
}

/// Plans the weeks-in-drought requests: one per threshold and statistic kind,
/// thresholds outermost, for each geography.
pub fn plan_weeks_in_drought(
    geographies: &[ResolvedGeography],
    thresholds: &[u8],
    stats: &[WeeksStatistic],
    period: &DatePeriod,
    base_url: &str,
) -> Result<Vec<QueryGroup>, UsdmError> {
    if thresholds.is_empty() {
        return Err(UsdmError::InvalidArgument(
            "drought_threshold must contain at least one drought level".to_string(),
        ));
    }
    if stats.is_empty() {
        return Err(UsdmError::InvalidArgument(
            "stat must contain at least one statistic".to_string(),
        ));
    }
    let (start, end) = period.query_bounds();

    let mut groups = Vec::with_capacity(geographies.len());
    for geography in geographies {
        let mut queries = Vec::with_capacity(thresholds.len() * stats.len());
        for level in thresholds {
            for stat in stats {
                queries.push(PlannedQuery {
                    url: format!(
                        "{}{}{}?geography={}&dx={}&minimumweeks=0&startdate={}&enddate={}",
                        base_url,
                        WEEKS_AREA,
                        stat.endpoint(),
                        geography.code,
                        level,
                        start,
                        end
                    ),
                    relabel: weeks_relabel(*level),
                });
            }
        }
        groups.push(QueryGroup {
            identifiers: None,
            queries,
        });
    }
    Ok(groups)
}
