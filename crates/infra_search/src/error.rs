//! Search error types

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur while parsing queries or talking to the index
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query string could not be parsed
    #[error("Invalid query at position {position}: {message}")]
    InvalidQuery { message: String, position: usize },

    /// The search cluster could not be reached
    #[error("Search cluster unreachable: {0}")]
    Unreachable(String),

    /// The search cluster answered with an error status
    #[error("Search cluster returned {status}: {body}")]
    Status { status: u16, body: String },

    /// A document or response could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The adapter was misconfigured
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SearchError {
    pub fn invalid_query(message: impl Into<String>, position: usize) -> Self {
        SearchError::InvalidQuery {
            message: message.into(),
            position,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Unreachable(err.to_string())
    }
}

impl From<SearchError> for PortError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidQuery { .. } => PortError::invalid_query(err.to_string()),
            SearchError::Status { status: 400, ref body } => PortError::invalid_query(body.clone()),
            SearchError::Status { status, .. } if status >= 500 => PortError::ServiceUnavailable {
                service: "elasticsearch".to_string(),
            },
            SearchError::Unreachable(message) => PortError::connection(message),
            other => PortError::internal(other.to_string()),
        }
    }
}
