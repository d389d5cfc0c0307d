use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeographyError {
    #[error("{0}")]
    InvalidGeography(String),

    #[error("Unable to convert {0}")]
    Conversion(String),

    #[error("Failed to read FIPS reference file '{0}'")]
    ReferenceRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse FIPS reference table")]
    ReferenceParse(#[source] PolarsError),

    #[error("FIPS reference table is missing required column '{0}'")]
    MissingReferenceColumn(String),
}
