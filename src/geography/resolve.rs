use crate::geography::error::GeographyError;
use crate::geography::fips_table::FipsTable;
use crate::types::geography::{
    GeographyLevel, GeographyToken, GeographyType, ResolvedGeography, NATIONAL_CONUS,
    NATIONAL_TOTAL,
};

const INVALID_STATE: &str = "Invalid area of interest specified. Either use the state's 2 letter abbreviation or the state's FIPS code. If you are attempting to specify a county as the area of interest, use the county's  5-digit FIPS code.";
const INVALID_AREA: &str = "Invalid area of interest specified.";

impl FipsTable {
    /// Resolves a geography token into its canonical code and level.
    ///
    /// * `"us"` becomes `"TOTAL"`; `"conus"` and `"total"` become `"CONUS"`.
    /// * Tokens of one or two characters are states, matched by abbreviation
    ///   first and numeric code second; the abbreviation is returned.
    /// * Longer tokens are county FIPS codes, returned zero-padded to five digits.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError::InvalidGeography`] if the token matches nothing.
    pub fn resolve(
        &self,
        geography: &GeographyToken,
        geography_type: Option<GeographyType>,
    ) -> Result<ResolvedGeography, GeographyError> {
        let token = geography.to_string().trim().to_lowercase();

        match token.as_str() {
            "us" => return Ok(ResolvedGeography::new(NATIONAL_TOTAL, GeographyLevel::National)),
            "conus" | "total" => {
                return Ok(ResolvedGeography::new(NATIONAL_CONUS, GeographyLevel::National))
            }
            _ => {}
        }

        match geography_type.unwrap_or_default() {
            GeographyType::Fips => self.resolve_fips(&token),
        }
    }

    fn resolve_fips(&self, token: &str) -> Result<ResolvedGeography, GeographyError> {
        if token.chars().count() <= 2 {
            if let Some(record) = self.state_by_abbr(token) {
                return Ok(ResolvedGeography::new(&record.state_abbr, GeographyLevel::State));
            }
            return token
                .parse::<i64>()
                .ok()
                .and_then(|code| self.state_by_number(code))
                .map(|record| ResolvedGeography::new(&record.state_abbr, GeographyLevel::State))
                .ok_or_else(|| GeographyError::InvalidGeography(INVALID_STATE.to_string()));
        }

        token
            .parse::<i64>()
            .ok()
            .filter(|code| *code >= 0)
            .map(|code| format!("{:05}", code))
            .and_then(|fips| self.county_record(&fips))
            .map(|record| ResolvedGeography::new(&record.full_fips, GeographyLevel::County))
            .ok_or_else(|| GeographyError::InvalidGeography(INVALID_AREA.to_string()))
    }

    /// The canonical code of a geography token. See [`FipsTable::resolve`].
    pub fn resolve_geography(
        &self,
        geography: &GeographyToken,
        geography_type: Option<GeographyType>,
    ) -> Result<String, GeographyError> {
        self.resolve(geography, geography_type).map(|g| g.code)
    }

    /// The level of a geography token; invalid tokens are an error.
    pub fn geography_level(
        &self,
        geography: &GeographyToken,
        geography_type: Option<GeographyType>,
    ) -> Result<GeographyLevel, GeographyError> {
        self.resolve(geography, geography_type).map(|g| g.level)
    }

    /// Five-digit FIPS codes of every county in the given state, in table order.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError::InvalidGeography`] if the token is not a state.
    pub fn counties_in_state(&self, state: &GeographyToken) -> Result<Vec<String>, GeographyError> {
        let resolved = self.resolve(state, None)?;
        if resolved.level != GeographyLevel::State {
            return Err(GeographyError::InvalidGeography(format!(
                "'{}' is not a state",
                state
            )));
        }
        Ok(self
            .counties_of(&resolved.code)
            .map(|r| r.full_fips.clone())
            .collect())
    }

    /// Every state abbreviation in the table, sorted ascending and deduplicated.
    pub fn all_states(&self) -> Vec<String> {
        let mut states: Vec<String> = self.records().iter().map(|r| r.state_abbr.clone()).collect();
        states.sort();
        states.dedup();
        states
    }

    /// Converts an abbreviation to its two-digit state code, or a two-digit
    /// code to its abbreviation.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError::Conversion`] if `state` matches neither.
    pub fn convert_state_code(&self, state: &str) -> Result<String, GeographyError> {
        if let Some(record) = self.records().iter().find(|r| r.state_abbr == state) {
            return Ok(record.state_code.clone());
        }
        if let Some(record) = self.records().iter().find(|r| r.state_code == state) {
            return Ok(record.state_abbr.clone());
        }
        Err(GeographyError::Conversion(state.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn table() -> Arc<FipsTable> {
        FipsTable::bundled().unwrap()
    }

    fn resolve(token: impl Into<GeographyToken>) -> Result<String, GeographyError> {
        table().resolve_geography(&token.into(), None)
    }

    fn level(token: impl Into<GeographyToken>) -> Result<GeographyLevel, GeographyError> {
        table().geography_level(&token.into(), None)
    }

    #[test]
    fn test_resolve_states() {
        assert_eq!(resolve(1).unwrap(), "AL");
        assert_eq!(resolve("01").unwrap(), "AL");
        assert_eq!(resolve("AL").unwrap(), "AL");
        assert_eq!(resolve("al").unwrap(), "AL");
        assert_eq!(resolve(" va ").unwrap(), "VA");
    }

    #[test]
    fn test_resolve_counties() {
        assert_eq!(resolve(1001).unwrap(), "01001");
        assert_eq!(resolve("1001").unwrap(), "01001");
        assert_eq!(resolve("01001").unwrap(), "01001");
        assert_eq!(resolve(51510).unwrap(), "51510");
    }

    #[test]
    fn test_national_sentinels_are_distinct() {
        assert_eq!(resolve("us").unwrap(), "TOTAL");
        assert_eq!(resolve("US").unwrap(), "TOTAL");
        assert_eq!(resolve("conus").unwrap(), "CONUS");
        assert_eq!(resolve("total").unwrap(), "CONUS");
        assert_eq!(resolve("TOTAL").unwrap(), "CONUS");
    }

    #[test]
    fn test_resolve_invalid() {
        let err = resolve("invalid_geography").unwrap_err();
        assert!(matches!(err, GeographyError::InvalidGeography(_)));
        assert!(resolve("zz").is_err());
        assert!(resolve(3).is_err());
        assert!(resolve(99999).is_err());
        assert!(resolve(-1001).is_err());
    }

    #[test]
    fn test_geography_level() {
        assert_eq!(level(1).unwrap(), GeographyLevel::State);
        assert_eq!(level("01").unwrap(), GeographyLevel::State);
        assert_eq!(level("al").unwrap(), GeographyLevel::State);
        assert_eq!(level(1001).unwrap(), GeographyLevel::County);
        assert_eq!(level("01001").unwrap(), GeographyLevel::County);
        assert_eq!(level("us").unwrap(), GeographyLevel::National);
        assert_eq!(level("CONUS").unwrap(), GeographyLevel::National);
        assert_eq!(level("total").unwrap(), GeographyLevel::National);
        assert!(level("invalid").is_err());
    }

    #[test]
    fn test_counties_in_state_share_prefix() {
        let table = table();
        for state in table.all_states() {
            let counties = table.counties_in_state(&GeographyToken::from(state.as_str())).unwrap();
            let prefix = table.convert_state_code(&state).unwrap();
            assert!(!counties.is_empty(), "no counties for {}", state);
            assert!(
                counties.iter().all(|c| c.len() == 5 && c.starts_with(&prefix)),
                "county outside {} in {:?}",
                state,
                counties
            );
        }
    }

    #[test]
    fn test_counties_in_state_alabama() {
        let counties = table().counties_in_state(&GeographyToken::from(1)).unwrap();
        assert_eq!(counties.len(), 67);
        assert!(counties.contains(&"01001".to_string()));
        assert!(counties.contains(&"01133".to_string()));
    }

    #[test]
    fn test_counties_in_state_known_counts() {
        for (state, count) in [("VA", 133), ("TX", 254), ("GA", 159), ("DC", 1), ("PR", 78), ("AK", 29)] {
            let counties = table().counties_in_state(&GeographyToken::from(state)).unwrap();
            assert_eq!(counties.len(), count, "county count for {}", state);
        }
        assert_eq!(resolve("51059").unwrap(), "51059");
        assert_eq!(resolve(51840).unwrap(), "51840");
        assert_eq!(resolve(55078).unwrap(), "55078");
    }

    #[test]
    fn test_counties_in_state_rejects_county() {
        assert!(table().counties_in_state(&GeographyToken::from("01001")).is_err());
    }

    #[test]
    fn test_all_states_sorted_unique() {
        let states = table().all_states();
        let mut sorted = states.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(states, sorted);
        for s in ["CA", "TX", "NY"] {
            assert!(states.contains(&s.to_string()));
        }
    }

    #[test]
    fn test_convert_state_code() {
        let table = table();
        assert_eq!(table.convert_state_code("VA").unwrap(), "51");
        assert_eq!(table.convert_state_code("01").unwrap(), "AL");
        let err = table.convert_state_code("XX").unwrap_err();
        assert_eq!(err.to_string(), "Unable to convert XX");
    }
}
