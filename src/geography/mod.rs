//! Geography resolution against the FIPS reference table.

pub mod error;
pub mod fips_table;
pub mod resolve;
pub mod state_names;

use crate::geography::error::GeographyError;
use crate::geography::fips_table::FipsTable;
use crate::types::geography::{GeographyLevel, GeographyToken, GeographyType};

/// Resolves a geography token against the bundled FIPS table.
///
/// See [`FipsTable::resolve_geography`].
pub fn resolve_geography(
    geography: impl Into<GeographyToken>,
    geography_type: Option<GeographyType>,
) -> Result<String, GeographyError> {
    FipsTable::bundled()?.resolve_geography(&geography.into(), geography_type)
}

/// Determines the level of a geography token using the bundled FIPS table.
pub fn geography_level(
    geography: impl Into<GeographyToken>,
    geography_type: Option<GeographyType>,
) -> Result<GeographyLevel, GeographyError> {
    FipsTable::bundled()?.geography_level(&geography.into(), geography_type)
}

/// Five-digit FIPS codes of every county in a state, from the bundled table.
pub fn counties_in_state(state: impl Into<GeographyToken>) -> Result<Vec<String>, GeographyError> {
    FipsTable::bundled()?.counties_in_state(&state.into())
}

/// Every state abbreviation in the bundled table, sorted and deduplicated.
pub fn all_states() -> Result<Vec<String>, GeographyError> {
    Ok(FipsTable::bundled()?.all_states())
}

/// Converts a state abbreviation to its two-digit code, or a code to its abbreviation.
pub fn convert_state_code(state: &str) -> Result<String, GeographyError> {
    FipsTable::bundled()?.convert_state_code(state)
}
