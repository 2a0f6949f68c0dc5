// In crates/engine/src/error.rs

use thiserror::Error;

/// Failures that abort a single decision cycle.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Risk check failed: {0}")]
    Risk(#[from] risk::Error),

    #[error("Execution failed: {0}")]
    Execution(#[from] execution::Error),

    #[error("Failed to fetch balance: {0}")]
    Balance(#[from] api_client::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
