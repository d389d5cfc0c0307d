use crate::error::UsdmError;
use crate::retrieval::error::RetrievalError;
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;

/// Status and raw body of one HTTP response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Issues one GET request for JSON. Implemented by [`HttpFetcher`] and by test doubles.
pub trait JsonFetcher: Send + Sync {
    fn fetch_json(&self, url: &str) -> Result<FetchResponse, UsdmError>;
}

/// Blocking `reqwest` client that asks for JSON.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl JsonFetcher for HttpFetcher {
    fn fetch_json(&self, url: &str) -> Result<FetchResponse, UsdmError> {
        debug!("Requesting {}", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|e| RetrievalError::NetworkRequest(url.to_string(), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP error for {}: {}", url, status);
        }
        let body = response
            .bytes()
            .map_err(|e| RetrievalError::NetworkRequest(url.to_string(), e))?
            .to_vec();
        Ok(FetchResponse { status, body })
    }
}

/// Fetches `url` and fails on any status other than 200.
pub(crate) fn fetch_ok(fetcher: &dyn JsonFetcher, url: &str) -> Result<Vec<u8>, UsdmError> {
    let response = fetcher.fetch_json(url)?;
    if response.status != StatusCode::OK {
        return Err(RetrievalError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        }
        .into());
    }
    Ok(response.body)
}
