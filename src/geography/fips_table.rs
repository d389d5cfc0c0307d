//! The FIPS reference table: one row per county with its state abbreviation
//! and codes. A copy is bundled with the crate and parsed once per process;
//! alternative tables with the same columns can be loaded from disk.

use crate::geography::error::GeographyError;
use log::{debug, info};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, OnceLock};

const BUNDLED_CSV: &[u8] = include_bytes!("../../data/fips_codes.csv");

static BUNDLED: OnceLock<Arc<FipsTable>> = OnceLock::new();

/// One county row of the reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FipsRecord {
    /// Two-letter state abbreviation, e.g. `"AL"`.
    pub state_abbr: String,
    /// Two-digit state code, e.g. `"01"`.
    pub state_code: String,
    /// Three-digit county code within the state, e.g. `"001"`.
    pub county_code: String,
    pub county_name: String,
    /// `state_code` followed by `county_code`, e.g. `"01001"`.
    pub full_fips: String,
}

impl FipsRecord {
    /// Builds a record, zero-padding numeric codes and deriving `full_fips`.
    pub fn new(state_abbr: &str, state_code: &str, county_code: &str, county_name: &str) -> Self {
        let state_code = format!("{:0>2}", state_code.trim());
        let county_code = format!("{:0>3}", county_code.trim());
        Self {
            state_abbr: state_abbr.trim().to_string(),
            full_fips: format!("{}{}", state_code, county_code),
            state_code,
            county_code,
            county_name: county_name.trim().to_string(),
        }
    }
}

/// Immutable, insertion-ordered set of [`FipsRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct FipsTable {
    records: Vec<FipsRecord>,
}

impl FipsTable {
    pub fn new(records: Vec<FipsRecord>) -> Self {
        Self { records }
    }

    /// The table bundled with the crate, parsed on first use.
    pub fn bundled() -> Result<Arc<FipsTable>, GeographyError> {
        if let Some(table) = BUNDLED.get() {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(Self::from_csv_bytes(BUNDLED_CSV)?);
        info!("Loaded bundled FIPS table with {} counties", table.len());
        Ok(Arc::clone(BUNDLED.get_or_init(|| table)))
    }

    /// Loads a table from a CSV file with `state,state_code,county_code,county_name` columns.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GeographyError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| GeographyError::ReferenceRead(path.to_path_buf(), e))?;
        debug!("Read FIPS reference file {:?} ({} bytes)", path, bytes.len());
        Self::from_csv_bytes(&bytes)
    }

    /// Parses CSV bytes with `state,state_code,county_code,county_name` columns.
    ///
    /// Every column is read as text so codes keep their leading zeros; unpadded
    /// codes are padded.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, GeographyError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()
            .map_err(GeographyError::ReferenceParse)?;

        let state = Self::text_column(&df, "state")?;
        let state_code = Self::text_column(&df, "state_code")?;
        let county_code = Self::text_column(&df, "county_code")?;
        let county_name = Self::text_column(&df, "county_name")?;

        let records = state
            .into_iter()
            .zip(state_code)
            .zip(county_code)
            .zip(county_name)
            .filter_map(|(((abbr, state_code), county_code), name)| {
                Some(FipsRecord::new(abbr?, state_code?, county_code?, name.unwrap_or("")))
            })
            .collect();

        Ok(Self::new(records))
    }

    fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked, GeographyError> {
        df.column(name)
            .and_then(|c| c.str())
            .map_err(|_| GeographyError::MissingReferenceColumn(name.to_string()))
    }

    pub fn records(&self) -> &[FipsRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record of the state with this abbreviation (case-insensitive).
    pub fn state_by_abbr(&self, abbr: &str) -> Option<&FipsRecord> {
        self.records
            .iter()
            .find(|r| r.state_abbr.eq_ignore_ascii_case(abbr))
    }

    /// First record of the state with this numeric code.
    pub fn state_by_number(&self, code: i64) -> Option<&FipsRecord> {
        self.records
            .iter()
            .find(|r| r.state_code.parse::<i64>().is_ok_and(|c| c == code))
    }

    /// The record of a county by its five-digit FIPS code.
    pub fn county_record(&self, full_fips: &str) -> Option<&FipsRecord> {
        self.records.iter().find(|r| r.full_fips == full_fips)
    }

    /// Records of every county in the state with this abbreviation, in table order.
    pub fn counties_of(&self, state_abbr: &str) -> impl Iterator<Item = &FipsRecord> + '_ {
        let state_abbr = state_abbr.to_string();
        self.records
            .iter()
            .filter(move |r| r.state_abbr.eq_ignore_ascii_case(&state_abbr))
    }
}
