mod error;
mod geography;
mod query;
mod retrieval;
mod time_period;
mod types;
mod usdm;
mod utils;

pub use error::UsdmError;
pub use usdm::*;

pub use geography::error::GeographyError;
pub use geography::fips_table::{FipsRecord, FipsTable};
pub use geography::state_names::state_name;
pub use geography::{
    all_states, convert_state_code, counties_in_state, geography_level, resolve_geography,
};

pub use time_period::resolve::{classify, resolve_dates};

pub use types::geography::*;
pub use types::group_by::GroupBy;
pub use types::statistic::{CompStatistic, EndpointFamily, WeeksStatistic, MAX_DROUGHT_LEVEL};
pub use types::time_period::*;

pub use query::{
    fan_out, plan_comp_stats, plan_weeks_in_drought, CompStatsRequest, FanOutUnit, GeoIdentifiers,
    QueryGroup, PlannedQuery,
};

pub use retrieval::assembler::ResultAssembler;
pub use retrieval::error::RetrievalError;
pub use retrieval::fetcher::{FetchResponse, HttpFetcher, JsonFetcher};
pub use retrieval::map_dates::MapDateCache;
pub use retrieval::progress::{log_progress, null_progress, LogProgress, NullProgress, ProgressReporter};
