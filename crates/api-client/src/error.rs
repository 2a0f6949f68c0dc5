// In crates/api-client/src/error.rs

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("Failed to sign request: {0}")]
    Signing(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    /// The exchange answered with a non-zero status code. The raw payload is kept for diagnosis.
    #[error("API error: code {code}, msg: {msg}")]
    ApiError { code: String, msg: String, payload: Value },
}

pub type Result<T> = std::result::Result<T, Error>;
