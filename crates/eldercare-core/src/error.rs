//! Error types for `Eldercare` core library.

use thiserror::Error;

/// Result type alias using `Eldercare` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `Eldercare` operations.
///
/// A deadline that elapses mid-stream is not represented here: cancellation
/// ends a stream with an end marker instead of an error. Likewise a single
/// NDJSON record that fails to parse is surfaced as raw text.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection-level failure while sending the request or reading the body
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A header name or value supplied by the caller is not valid HTTP
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::header::InvalidHeaderName> for Error {
    fn from(e: reqwest::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(e.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
    fn from(e: reqwest::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(e.to_string())
    }
}
