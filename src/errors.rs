// ⚠️ Errors - Mapping fetch failures
// Only fetching can fail; classification and label lookups are total

use std::path::PathBuf;

/// Failure to obtain a fresh mapping table
///
/// Recovered by the refresher: the previous snapshot stays in place and the
/// message is shown to the user alongside a retry action.
#[derive(Debug, thiserror::Error)]
pub enum MappingFetchError {
    /// Local mapping file could not be read
    #[error("Failed to read mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Backend request failed (connection, timeout, non-2xx status)
    #[error("Request to {url} failed: {message}")]
    Http { url: String, message: String },

    /// Payload was not a valid mapping table
    #[error("Invalid mapping table: {0}")]
    Decode(String),

    /// Backend answered without a result
    #[error("Backend returned no mappings: {0}")]
    Backend(String),

    /// Blocking fetch task did not complete
    #[error("Fetch task failed: {0}")]
    Task(String),
}

impl MappingFetchError {
    /// Human-readable message for notifications
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<serde_json::Error> for MappingFetchError {
    fn from(err: serde_json::Error) -> Self {
        MappingFetchError::Decode(err.to_string())
    }
}

impl From<tokio::task::JoinError> for MappingFetchError {
    fn from(err: tokio::task::JoinError) -> Self {
        MappingFetchError::Task(err.to_string())
    }
}
