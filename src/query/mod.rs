//! Planning of the HTTP requests behind each retrieval.
//!
//! A plan is an ordered list of [`QueryGroup`]s, one per fan-out geography.
//! Each group holds the URLs to fetch for that geography together with the
//! column renames for each response and the identifier columns to stamp on
//! its rows.

pub mod fan_out;
pub mod planner;

pub use fan_out::{fan_out, FanOutUnit, GeoIdentifiers};
pub use planner::{plan_comp_stats, plan_weeks_in_drought, CompStatsRequest, QueryGroup, PlannedQuery};
