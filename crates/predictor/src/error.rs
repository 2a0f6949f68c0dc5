// In crates/predictor/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the prediction client: {0}")]
    ClientBuildError(String),
    /// Transport failure or a non-success HTTP status.
    #[error("Prediction request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Failed to parse prediction: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
