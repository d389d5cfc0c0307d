use crate::geography::fips_table::{FipsRecord, FipsTable};
use crate::geography::state_names::state_name;
use crate::types::geography::{GeographyLevel, ResolvedGeography};
use crate::types::group_by::{GroupBy, COUNTY_GROUP_BY_LEVEL, STATE_GROUP_BY_LEVEL};
use crate::error::UsdmError;
use std::collections::HashSet;

/// Identifier columns appended to every row fetched for one geography.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoIdentifiers {
    pub columns: Vec<(&'static str, String)>,
}

impl GeoIdentifiers {
    fn for_county(record: &FipsRecord) -> Self {
        Self {
            columns: vec![
                ("county_fips", record.full_fips.clone()),
                ("county_name", record.county_name.clone()),
                ("state_code", record.state_code.clone()),
                ("state_name", Self::name_of(record)),
            ],
        }
    }

    fn for_state(record: &FipsRecord) -> Self {
        Self {
            columns: vec![
                ("state_code", record.state_code.clone()),
                ("state_name", Self::name_of(record)),
            ],
        }
    }

    fn name_of(record: &FipsRecord) -> String {
        state_name(&record.state_code)
            .map(str::to_string)
            .unwrap_or_else(|| record.state_abbr.clone())
    }
}

/// A geography to query, with the identifiers to attach to its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutUnit {
    pub geography: ResolvedGeography,
    pub identifiers: Option<GeoIdentifiers>,
}

impl FanOutUnit {
    fn county(record: &FipsRecord) -> Self {
        Self {
            geography: ResolvedGeography::new(&record.full_fips, GeographyLevel::County),
            identifiers: Some(GeoIdentifiers::for_county(record)),
        }
    }

    fn state(record: &FipsRecord) -> Self {
        Self {
            geography: ResolvedGeography::new(&record.state_abbr, GeographyLevel::State),
            identifiers: Some(GeoIdentifiers::for_state(record)),
        }
    }

    /// A listed geography queried as-is; states and counties carry identifiers.
    fn listed(geography: &ResolvedGeography, table: &FipsTable) -> Self {
        let identifiers = match geography.level {
            GeographyLevel::National => None,
            GeographyLevel::State => table.state_by_abbr(&geography.code).map(GeoIdentifiers::for_state),
            GeographyLevel::County => table
                .county_record(&geography.code)
                .map(GeoIdentifiers::for_county),
        };
        Self {
            geography: geography.clone(),
            identifiers,
        }
    }
}

/// Expands resolved geographies into the units queried for a group-by mode.
///
/// `is_list` marks geographies that came from a list input; those are
/// tagged with identifiers even without a group-by. Units are deduplicated
/// and keep planning order.
pub fn fan_out(
    geographies: &[ResolvedGeography],
    group_by: GroupBy,
    is_list: bool,
    table: &FipsTable,
) -> Result<Vec<FanOutUnit>, UsdmError> {
    let mut units = Vec::new();

    for geography in geographies {
        match (group_by, geography.level) {
            (GroupBy::None, _) if !is_list => units.push(FanOutUnit {
                geography: geography.clone(),
                identifiers: None,
            }),
            (GroupBy::None, _) => units.push(FanOutUnit::listed(geography, table)),
            (GroupBy::County, GeographyLevel::State) => {
                units.extend(table.counties_of(&geography.code).map(FanOutUnit::county))
            }
            (GroupBy::County, GeographyLevel::National) => {
                units.extend(table.records().iter().map(FanOutUnit::county))
            }
            (GroupBy::State, GeographyLevel::National) => {
                for state in table.all_states() {
                    if let Some(record) = table.state_by_abbr(&state) {
                        units.push(FanOutUnit::state(record));
                    }
                }
            }
            (GroupBy::County, GeographyLevel::County) => {
                return Err(UsdmError::InvalidGroupBy(COUNTY_GROUP_BY_LEVEL.to_string()))
            }
            (GroupBy::State, _) => {
                return Err(UsdmError::InvalidGroupBy(STATE_GROUP_BY_LEVEL.to_string()))
            }
        }
    }

    let mut seen = HashSet::new();
    units.retain(|unit| seen.insert(unit.geography.code.clone()));
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn table() -> Arc<FipsTable> {
        FipsTable::bundled().unwrap()
    }

    #[test]
    fn test_single_geography_has_no_identifiers() {
        let va = ResolvedGeography::new("VA", GeographyLevel::State);
        let units = fan_out(&[va.clone()], GroupBy::None, false, &table()).unwrap();
        assert_eq!(units, vec![FanOutUnit { geography: va, identifiers: None }]);
    }

    #[test]
    fn test_state_grouped_by_county() {
        let table = table();
        let al = ResolvedGeography::new("AL", GeographyLevel::State);
        let units = fan_out(&[al], GroupBy::County, false, &table).unwrap();
        assert_eq!(units.len(), 67);
        assert!(units.iter().all(|u| u.geography.level == GeographyLevel::County));

        let first = &units[0];
        assert_eq!(first.geography.code, "01001");
        let ids = first.identifiers.as_ref().unwrap();
        assert_eq!(
            ids.columns,
            vec![
                ("county_fips", "01001".to_string()),
                ("county_name", "Autauga County".to_string()),
                ("state_code", "01".to_string()),
                ("state_name", "Alabama".to_string()),
            ]
        );
    }

    #[test]
    fn test_national_grouped_by_state() {
        let table = table();
        let us = ResolvedGeography::new("TOTAL", GeographyLevel::National);
        let units = fan_out(&[us], GroupBy::State, false, &table).unwrap();
        let codes: Vec<_> = units.iter().map(|u| u.geography.code.clone()).collect();
        assert_eq!(codes, table.all_states());
        assert_eq!(codes.len(), 52);
        assert_eq!(
            units[0].identifiers.as_ref().unwrap().columns.len(),
            2
        );
    }

    #[test]
    fn test_national_grouped_by_county_covers_table() {
        let table = table();
        let conus = ResolvedGeography::new("CONUS", GeographyLevel::National);
        let units = fan_out(&[conus], GroupBy::County, false, &table).unwrap();
        assert_eq!(units.len(), 3220);
        assert_eq!(units.len(), table.len());
    }

    #[test]
    fn test_list_deduplicates() {
        let table = table();
        let va = ResolvedGeography::new("VA", GeographyLevel::State);
        let units = fan_out(&[va.clone(), va], GroupBy::County, true, &table).unwrap();
        assert_eq!(units.len(), 133);
    }

    #[test]
    fn test_list_without_group_by_tags_rows() {
        let table = table();
        let geos = [
            ResolvedGeography::new("VA", GeographyLevel::State),
            ResolvedGeography::new("NC", GeographyLevel::State),
        ];
        let units = fan_out(&geos, GroupBy::None, true, &table).unwrap();
        assert_eq!(
            units[1].identifiers.as_ref().unwrap().columns[1],
            ("state_name", "North Carolina".to_string())
        );
    }

    #[test]
    fn test_incompatible_group_by() {
        let table = table();
        let county = ResolvedGeography::new("01001", GeographyLevel::County);
        assert!(matches!(
            fan_out(&[county], GroupBy::County, false, &table),
            Err(UsdmError::InvalidGroupBy(_))
        ));
        let state = ResolvedGeography::new("VA", GeographyLevel::State);
        assert!(matches!(
            fan_out(&[state], GroupBy::State, false, &table),
            Err(UsdmError::InvalidGroupBy(_))
        ));
    }
}
