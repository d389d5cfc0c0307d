use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP status code: {status} for {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse JSON response from {0}")]
    JsonParse(String, #[source] serde_json::Error),

    #[error("Unexpected response from {url}: {message}")]
    UnexpectedPayload { url: String, message: String },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
