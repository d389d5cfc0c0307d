use crate::error::UsdmError;
use crate::retrieval::error::RetrievalError;
use crate::retrieval::fetcher::{fetch_ok, JsonFetcher};
use crate::time_period::resolve::resolve_dates;
use crate::types::time_period::{DatePeriod, TimePeriod};
use crate::utils::{current_year, parse_service_date, parse_slash_date};
use chrono::NaiveDate;
use log::{debug, info};
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

static GLOBAL: OnceLock<Arc<MapDateCache>> = OnceLock::new();

const MAP_DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapDateRecord {
    map_date: String,
}

/// Memoized list of the dates on which drought maps were published.
///
/// The list is fetched on first use and kept until [`MapDateCache::invalidate`].
#[derive(Debug, Default)]
pub struct MapDateCache {
    dates: Mutex<Option<Arc<Vec<NaiveDate>>>>,
}

impl MapDateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache already holding `dates`; nothing is fetched.
    pub fn with_dates(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates: Mutex::new(Some(Arc::new(dates))),
        }
    }

    /// The cache shared by every client in the process.
    pub fn global() -> Arc<MapDateCache> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(MapDateCache::new())))
    }

    pub fn invalidate(&self) {
        *self.slot() = None;
    }

    /// The slot only ever holds a complete list, so a poisoned lock is still usable.
    fn slot(&self) -> MutexGuard<'_, Option<Arc<Vec<NaiveDate>>>> {
        self.dates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self) -> Option<Arc<Vec<NaiveDate>>> {
        self.slot().clone()
    }

    /// Every map date from 2000 through the current year, fetched once.
    pub fn map_dates(
        &self,
        fetcher: &dyn JsonFetcher,
        base_url: &str,
    ) -> Result<Arc<Vec<NaiveDate>>, UsdmError> {
        if let Some(dates) = self.cached() {
            return Ok(dates);
        }

        // Fetch outside the lock; a concurrent fill wins.
        let url = format!(
            "{}USStatistics/GetDroughtSeverityStatisticsByArea?aoi=TOTAL&startdate=01/01/2000&enddate=12/31/{}&statisticsType=1",
            base_url,
            current_year()
        );
        let body = fetch_ok(fetcher, &url)?;
        let records: Vec<MapDateRecord> = serde_json::from_slice(&body)
            .map_err(|e| RetrievalError::JsonParse(url.clone(), e))?;
        let loaded: Vec<NaiveDate> = records
            .iter()
            .filter_map(|r| parse_service_date(&r.map_date))
            .collect();
        info!("Loaded {} map dates", loaded.len());

        Ok(Arc::clone(self.slot().get_or_insert_with(|| Arc::new(loaded))))
    }

    /// The published map date nearest to `date`, formatted `YYYYMMDD`.
    /// The earliest of equally distant dates wins.
    ///
    /// # Errors
    ///
    /// Returns [`UsdmError::InvalidTimePeriod`] if `date` is not a single
    /// date, and a retrieval error if no map dates are available.
    pub fn closest_map_date(
        &self,
        fetcher: &dyn JsonFetcher,
        base_url: &str,
        date: impl Into<TimePeriod>,
    ) -> Result<String, UsdmError> {
        let target = single_date(&date.into())?;
        let dates = self.map_dates(fetcher, base_url)?;

        let closest = dates
            .iter()
            .min_by_key(|d| (**d - target).num_days().abs())
            .ok_or_else(|| RetrievalError::UnexpectedPayload {
                url: base_url.to_string(),
                message: "no map dates available".to_string(),
            })?;
        debug!("Closest map date to {} is {}", target, closest);
        Ok(closest.format(MAP_DATE_FORMAT).to_string())
    }
}

fn single_date(period: &TimePeriod) -> Result<NaiveDate, UsdmError> {
    let invalid = || UsdmError::InvalidTimePeriod(format!("Unable to read {:?} as a date", period));
    match resolve_dates(period).map_err(|_| invalid())? {
        DatePeriod::Single(value) => parse_slash_date(&value).ok_or_else(invalid),
        DatePeriod::Range { .. } => Err(invalid()),
    }
}
