use crate::geography::error::GeographyError;
use crate::retrieval::error::RetrievalError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UsdmError {
    #[error(transparent)]
    Geography(#[from] GeographyError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("{0}")]
    InvalidTimePeriod(String),

    #[error("{0}")]
    InvalidGroupBy(String),

    #[error("{0}")]
    InvalidArgument(String),
}

impl From<PolarsError> for UsdmError {
    fn from(e: PolarsError) -> Self {
        UsdmError::Retrieval(RetrievalError::DataFrameProcessing(e))
    }
}
