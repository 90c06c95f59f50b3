//! Error types for GraphQL transport operations.

use thiserror::Error;

/// Result type for GraphQL transport operations.
pub type Result<T> = std::result::Result<T, GraphqlError>;

/// Errors that can occur while talking to the post backend.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GraphqlError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("GraphQL error: {0}")]
    Graphql(String),

    #[error("Post {0} already exists")]
    Conflict(String),

    #[error("Post {0} not found")]
    NotFound(String),

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Subscription closed")]
    SubscriptionClosed,

    #[error("Operation timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for GraphqlError {
    fn from(err: serde_json::Error) -> Self {
        GraphqlError::Json(err.to_string())
    }
}

impl From<reqwest::Error> for GraphqlError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GraphqlError::Timeout
        } else {
            GraphqlError::Http(err.to_string())
        }
    }
}

impl GraphqlError {
    /// Check if this error is retryable.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            GraphqlError::Status(status) => crate::client::is_retryable_status(*status),
            GraphqlError::Http(_) | GraphqlError::Timeout => true,
            _ => false,
        }
    }

    /// Check if the backend rejected a create because the id is taken.
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, GraphqlError::Conflict(_))
    }
}
