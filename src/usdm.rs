//! The main entry point: a [`Usdm`] client bound to one geography and one
//! time period, with one method per data service.

use crate::error::UsdmError;
use crate::geography::error::GeographyError;
use crate::geography::fips_table::FipsTable;
use crate::query::{fan_out, plan_comp_stats, plan_weeks_in_drought, CompStatsRequest};
use crate::retrieval::assembler::ResultAssembler;
use crate::retrieval::error::RetrievalError;
use crate::retrieval::fetcher::{fetch_ok, HttpFetcher, JsonFetcher};
use crate::retrieval::frame::{constant_date_column, drop_unrequested_levels};
use crate::retrieval::map_dates::MapDateCache;
use crate::retrieval::progress::{log_progress, ProgressReporter};
use crate::time_period::resolve::resolve_dates;
use crate::types::geography::{GeographyInput, GeographyLevel, GeographyType, ResolvedGeography};
use crate::types::group_by::{GroupBy, COUNTY_GROUP_BY_LEVEL, STATE_GROUP_BY_LEVEL, STATE_LIST_GROUP_BY};
use crate::types::statistic::{
    all_drought_levels, validate_drought_levels, CompStatistic, WeeksStatistic,
};
use crate::types::time_period::{DatePeriod, TimePeriod};
use crate::utils::{parse_slash_date, US_DATE_FORMAT};
use bon::bon;
use log::{debug, info, warn};
use polars::prelude::DataFrame;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Default root of the statistics web services.
pub const DEFAULT_BASE_URL: &str = "https://usdmdataservices.unl.edu/api/";
/// Default root of the GeoJSON drought maps.
pub const DEFAULT_SPATIAL_URL: &str = "https://droughtmonitor.unl.edu/data/json/";

const MIXED_LIST: &str = "All geographies in list must be the same type";
const SINGLE_DATE_REQUIRED: &str = "The time_period parameter must be a single date when using the get_spatial_data method of the format '%m/%d/%Y'. Example: 'time_period = '6/5/2016'";

/// A drought statistics client for one geography (or list of geographies)
/// and one time period.
///
/// Construction validates the geography, the group-by mode and the time
/// period; every retrieval afterwards issues blocking HTTP requests.
pub struct Usdm {
    geographies: Vec<ResolvedGeography>,
    is_list: bool,
    group_by: GroupBy,
    period: DatePeriod,
    base_url: String,
    spatial_url: String,
    fetcher: Arc<dyn JsonFetcher>,
    fips_table: Arc<FipsTable>,
    map_dates: Arc<MapDateCache>,
    progress: Arc<dyn ProgressReporter>,
}

#[bon]
impl Usdm {
    /// Creates a client.
    ///
    /// # Arguments
    ///
    /// * `.geography(..)`: **Required.** A state abbreviation or code, a county
    ///   FIPS code, `"us"`/`"conus"`/`"total"`, or a list of these.
    /// * `.time_period(..)`: **Required.** A year, a list of years, a date,
    ///   or a start and end date.
    /// * `.group_by(GroupBy)`: Fan out to every county or state of the geography.
    /// * `.base_url(..)` / `.spatial_url(..)`: Override the service roots.
    /// * `.fetcher(..)`, `.fips_table(..)`, `.map_dates(..)`, `.progress(..)`:
    ///   Replace the HTTP client, the FIPS reference table, the map-date cache
    ///   and the progress reporter.
    ///
    /// # Errors
    ///
    /// Geography errors come first, then group-by errors, then
    /// [`UsdmError::InvalidTimePeriod`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use usdm::{GroupBy, Usdm, UsdmError};
    /// let client = Usdm::builder()
    ///     .geography("VA")
    ///     .time_period(2023)
    ///     .group_by(GroupBy::County)
    ///     .build()?;
    /// assert_eq!(client.time_period(), &["01/01/2023", "12/31/2023"]);
    ///
    /// let err = Usdm::builder().geography("VA").time_period(2023).group_by(GroupBy::State).build();
    /// assert!(matches!(err, Err(UsdmError::InvalidGroupBy(_))));
    /// # Ok::<(), UsdmError>(())
    /// ```
    #[builder]
    pub fn new(
        #[builder(into)] geography: GeographyInput,
        #[builder(into)] time_period: TimePeriod,
        geography_type: Option<GeographyType>,
        group_by: Option<GroupBy>,
        #[builder(into)] base_url: Option<String>,
        #[builder(into)] spatial_url: Option<String>,
        fetcher: Option<Arc<dyn JsonFetcher>>,
        fips_table: Option<Arc<FipsTable>>,
        map_dates: Option<Arc<MapDateCache>>,
        progress: Option<Arc<dyn ProgressReporter>>,
    ) -> Result<Self, UsdmError> {
        let fips_table = match fips_table {
            Some(table) => table,
            None => FipsTable::bundled()?,
        };
        let fetcher: Arc<dyn JsonFetcher> = match fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new()),
        };
        let group_by = group_by.unwrap_or_default();

        let geographies = geography
            .tokens()
            .into_iter()
            .map(|token| fips_table.resolve(token, geography_type))
            .collect::<Result<Vec<_>, _>>()?;
        let is_list = geography.is_list();
        Self::validate_group_by(&geographies, is_list, group_by)?;

        let period = resolve_dates(&time_period)?;
        debug!(
            "Resolved geographies {:?} for period {:?}",
            geographies.iter().map(|g| g.code.as_str()).collect::<Vec<_>>(),
            period.as_list()
        );

        Ok(Self {
            geographies,
            is_list,
            group_by,
            period,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            spatial_url: spatial_url.unwrap_or_else(|| DEFAULT_SPATIAL_URL.to_string()),
            fetcher,
            fips_table,
            map_dates: map_dates.unwrap_or_else(MapDateCache::global),
            progress: progress.unwrap_or_else(log_progress),
        })
    }

    fn validate_group_by(
        geographies: &[ResolvedGeography],
        is_list: bool,
        group_by: GroupBy,
    ) -> Result<(), UsdmError> {
        let Some(level) = geographies.first().map(|g| g.level) else {
            return Err(GeographyError::InvalidGeography(MIXED_LIST.to_string()).into());
        };
        if geographies.iter().any(|g| g.level != level) {
            return Err(GeographyError::InvalidGeography(MIXED_LIST.to_string()).into());
        }

        let message = match (group_by, level) {
            (GroupBy::State, _) if is_list => Some(STATE_LIST_GROUP_BY),
            (GroupBy::State, GeographyLevel::State | GeographyLevel::County) => {
                Some(STATE_GROUP_BY_LEVEL)
            }
            (GroupBy::County, GeographyLevel::County) => Some(COUNTY_GROUP_BY_LEVEL),
            _ => None,
        };
        match message {
            Some(message) => Err(UsdmError::InvalidGroupBy(message.to_string())),
            None => Ok(()),
        }
    }

    /// Fetches comprehensive statistics, one column per drought category and
    /// statistic (e.g. `D2_AreaPercent`, `NONE_Population`, `DSCI`).
    ///
    /// # Arguments
    ///
    /// * `.stat(Vec<CompStatistic>)`: Statistics to fetch, all five by default.
    /// * `.drought_threshold(Vec<u8>)`: Drought categories to keep, `0..=4` by default.
    /// * `.threshold_range((u8, u8))`: Use the basic statistics for this inclusive
    ///   category window. The first drought threshold is sent as `dx`.
    ///
    /// Columns for categories outside `drought_threshold` are dropped.
    #[builder]
    pub fn get_comp_stats(
        &self,
        stat: Option<Vec<CompStatistic>>,
        drought_threshold: Option<Vec<u8>>,
        threshold_range: Option<(u8, u8)>,
    ) -> Result<DataFrame, UsdmError> {
        let thresholds = drought_threshold.unwrap_or_else(all_drought_levels);
        validate_drought_levels(&thresholds)?;
        if let Some((a, b)) = threshold_range {
            validate_drought_levels(&[a, b])?;
        }
        let request = CompStatsRequest {
            stats: stat.unwrap_or_else(|| CompStatistic::ALL.to_vec()),
            thresholds,
            threshold_range,
        };

        let units = fan_out(&self.geographies, self.group_by, self.is_list, &self.fips_table)?;
        let plan = plan_comp_stats(&units, &request, &self.period, &self.base_url, &self.fips_table)?;
        info!(
            "Fetching comprehensive statistics for {} geographies",
            units.len()
        );

        let df = ResultAssembler::new(self.fetcher.as_ref(), self.progress.as_ref())
            .assemble("comprehensive statistics", &plan)?;
        Ok(drop_unrequested_levels(&df, &request.thresholds)?)
    }

    /// Fetches county-level weeks in drought for each geography.
    ///
    /// Columns are `D{n}_ConsecutiveWeeks`, `D{n}_NonConsecutiveWeeks` and the
    /// consecutive run's `D{n}_ConsecutiveWeeksStartDate`/`EndDate` for every
    /// requested category, plus the query bounds as `QueryStartDate` and
    /// `QueryEndDate`. The group-by mode does not apply here.
    #[builder]
    pub fn get_weeks_in_drought(
        &self,
        drought_threshold: Option<Vec<u8>>,
        stat: Option<Vec<WeeksStatistic>>,
    ) -> Result<DataFrame, UsdmError> {
        let thresholds = drought_threshold.unwrap_or_else(all_drought_levels);
        validate_drought_levels(&thresholds)?;
        let stats = stat.unwrap_or_else(|| WeeksStatistic::ALL.to_vec());

        let plan = plan_weeks_in_drought(
            &self.geographies,
            &thresholds,
            &stats,
            &self.period,
            &self.base_url,
        )?;
        let mut df = ResultAssembler::new(self.fetcher.as_ref(), self.progress.as_ref())
            .assemble("weeks in drought", &plan)?;

        let (start, end) = self.period.query_bounds();
        let height = df.height();
        for (name, bound) in [("QueryStartDate", start), ("QueryEndDate", end)] {
            let date = parse_slash_date(&bound).ok_or_else(|| {
                UsdmError::InvalidTimePeriod(format!("Unable to read {} as a date", bound))
            })?;
            df.with_column(constant_date_column(name, date, height)?)?;
        }
        Ok(df)
    }

    /// Fetches the GeoJSON drought map closest to the client's date, keyed by
    /// that date as `MM/DD/YYYY`.
    ///
    /// Maps cover the whole United States; other geographies fall back to it.
    ///
    /// # Errors
    ///
    /// Returns [`UsdmError::InvalidTimePeriod`] unless the time period is a single date.
    pub fn get_spatial_data(&self) -> Result<HashMap<String, Value>, UsdmError> {
        if self
            .geographies
            .iter()
            .any(|g| g.level != GeographyLevel::National)
        {
            warn!("The get_spatial_data method is only applicable to national data. Defaulting to returning data for the whole United States.");
        }
        let DatePeriod::Single(date) = &self.period else {
            return Err(UsdmError::InvalidTimePeriod(SINGLE_DATE_REQUIRED.to_string()));
        };
        let requested = parse_slash_date(date)
            .ok_or_else(|| UsdmError::InvalidTimePeriod(SINGLE_DATE_REQUIRED.to_string()))?;

        let map_date = self.map_dates.closest_map_date(
            self.fetcher.as_ref(),
            &self.base_url,
            date.as_str(),
        )?;
        info!(
            "Retrieving data for map dated: {}/{}/{}",
            &map_date[4..6],
            &map_date[6..8],
            &map_date[0..4]
        );

        let url = format!("{}usdm_{}.json", self.spatial_url, map_date);
        let body = fetch_ok(self.fetcher.as_ref(), &url)?;
        let geojson: Value =
            serde_json::from_slice(&body).map_err(|e| RetrievalError::JsonParse(url, e))?;

        let mut result = HashMap::new();
        result.insert(requested.format(US_DATE_FORMAT).to_string(), geojson);
        Ok(result)
    }

    /// The published map date nearest to `date`, as `YYYYMMDD`.
    pub fn closest_map_date(&self, date: impl Into<TimePeriod>) -> Result<String, UsdmError> {
        self.map_dates
            .closest_map_date(self.fetcher.as_ref(), &self.base_url, date)
    }

    pub fn geographies(&self) -> &[ResolvedGeography] {
        &self.geographies
    }

    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    pub fn time_period(&self) -> &DatePeriod {
        &self.period
    }
}
