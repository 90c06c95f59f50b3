//! Error types for the synchronization core.

use std::io;
use thiserror::Error;

/// Result type for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors surfaced by the synchronizers. Failed writes and fetches end up in
/// the editor view as `last_error`; they never stop editing.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SyncError {
    #[error("Post {0} already exists")]
    Conflict(String),

    #[error("Network error: {0}")]
    Network(quill_graphql::GraphqlError),

    #[error("Post {0} not found")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    /// The handle's driver task is gone.
    #[error("Synchronizer closed")]
    Closed,
}

impl From<io::Error> for SyncError {
    fn from(err: io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Json(err.to_string())
    }
}

impl From<quill_graphql::GraphqlError> for SyncError {
    fn from(err: quill_graphql::GraphqlError) -> Self {
        use quill_graphql::GraphqlError;
        match err {
            GraphqlError::Conflict(id) => SyncError::Conflict(id),
            GraphqlError::NotFound(id) => SyncError::NotFound(id),
            GraphqlError::Config(msg) => SyncError::Config(msg),
            other => SyncError::Network(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_graphql::GraphqlError;

    #[test]
    fn test_transport_errors_are_classified() {
        assert!(matches!(
            SyncError::from(GraphqlError::Conflict("p".into())),
            SyncError::Conflict(id) if id == "p"
        ));
        assert!(matches!(
            SyncError::from(GraphqlError::Timeout),
            SyncError::Network(GraphqlError::Timeout)
        ));
        assert!(matches!(
            SyncError::from(GraphqlError::Config("bad".into())),
            SyncError::Config(_)
        ));
        assert!(matches!(
            SyncError::from(GraphqlError::NotFound("p".into())),
            SyncError::NotFound(id) if id == "p"
        ));
    }

    #[test]
    fn test_io_errors_keep_their_message() {
        let err = SyncError::from(io::Error::new(io::ErrorKind::NotFound, "no config"));
        assert_eq!(err, SyncError::Io("no config".into()));
        assert_eq!(err.to_string(), "I/O error: no config");
    }
}
