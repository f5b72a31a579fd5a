//! Error types shared across the pipeline.
//!
//! Per-page and per-review failures are absorbed where they happen and only
//! show up as diagnostics or as entries in the failure list. The one error
//! that reaches the caller on its own is [`AggregationError`], raised when a
//! report is requested over zero classified reviews.

use thiserror::Error;

/// A single page could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The remote answered with a non-success status code.
    #[error("http status {0}")]
    Status(u16),
    /// Connection, timeout or body decoding failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The page URL could not be built.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Transport(err.to_string()),
        }
    }
}

/// Invalid runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("page count must be at least 1")]
    ZeroPages,
    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("product id must not be empty")]
    EmptyProductId,
    #[error("invalid base url `{0}`")]
    InvalidBaseUrl(String),
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
}

/// Lexicon resources could not be loaded.
#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: malformed lexicon entry")]
    Malformed { path: String, line: usize },
}

/// Percentages were requested for an empty set of classified reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("no classifiable reviews: cannot derive percentages from a total of zero")]
    DivisionByZero,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display_carries_status() {
        assert_eq!(FetchError::Status(503).to_string(), "http status 503");
    }

    #[test]
    fn aggregation_error_is_explicit() {
        let msg = AggregationError::DivisionByZero.to_string();
        assert!(msg.contains("zero"));
    }
}
