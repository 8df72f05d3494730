//! Error types for the pulse connector pipeline.

use thiserror::Error;

/// Errors that can occur in the pulse connector pipeline.
///
/// `InvalidRecord` is recoverable: callers skip the offending record and
/// continue. Everything else is fatal for the run and propagates to the run
/// driver.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Error from the fetcher component (client setup and the like).
    #[error("Fetcher error: {0}")]
    FetcherError(String),

    /// A non-retryable HTTP status was returned by the source API.
    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// The retry ceiling was exhausted for a page request.
    #[error("Retries exhausted after {attempts} attempts for {url}")]
    RetryExhausted { url: String, attempts: u32 },

    /// A record did not have the shape the transformer requires.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Error parsing a response body.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The document store could not be reached at startup.
    #[error("Document store unreachable: {0}")]
    StoreUnreachable(String),

    /// Error from the loader component.
    #[error("Loader error: {0}")]
    LoaderError(String),
}

impl PipelineError {
    /// Create a fetcher error.
    pub fn fetcher(msg: impl Into<String>) -> Self {
        Self::FetcherError(msg.into())
    }

    /// Create an invalid record error.
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a store unreachable error.
    pub fn store_unreachable(msg: impl Into<String>) -> Self {
        Self::StoreUnreachable(msg.into())
    }

    /// Create a loader error.
    pub fn loader(msg: impl Into<String>) -> Self {
        Self::LoaderError(msg.into())
    }
}
