//! Common error types for coursegraph

use thiserror::Error;

/// Common result type for coursegraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while fetching, decoding, and persisting the catalog
#[derive(Error, Debug)]
pub enum Error {
    /// Vendor endpoint answered with a non-success HTTP status
    #[error("API call failed: {0}")]
    Fetch(reqwest::StatusCode),

    /// Response body did not match the JSONP envelope
    #[error("Malformed JSONP response: {0}")]
    MalformedResponse(String),

    /// JSON syntax failure or a document without a `data` array
    #[error("Parse error: {0}")]
    Parse(String),

    /// Transport-level error from the HTTP client
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
