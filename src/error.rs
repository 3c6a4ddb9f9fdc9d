//! Error types for provisioning-reloader.

use std::path::PathBuf;

/// Result type alias for provisioning-reloader operations.
pub type Result<T> = std::result::Result<T, ReloaderError>;

/// Errors that can occur while watching files or reloading provisioned config.
///
/// Construction errors (`WatcherInit`, `WatchPath`, `InvalidToken`,
/// `HttpClient`, `Settings`) abort startup. Request errors (`Request`,
/// `ReadBody`, `UnexpectedStatus`) are only ever logged by the dispatch loop.
#[derive(Debug, thiserror::Error)]
pub enum ReloaderError {
    /// The filesystem watcher could not be created.
    #[error("failed to create watcher: {0}")]
    WatcherInit(#[source] notify::Error),

    /// A path could not be registered for a reason other than non-existence.
    #[error("failed to add path {} to watcher: {source}", .path.display())]
    WatchPath {
        /// The path that failed to register
        path: PathBuf,
        /// Underlying watcher error
        #[source]
        source: notify::Error,
    },

    /// The service account token cannot be used as a header value.
    #[error("invalid bearer token: {0}")]
    InvalidToken(String),

    /// The HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Settings could not be loaded or failed validation.
    #[error("invalid settings: {0}")]
    Settings(String),

    /// The reload request could not be sent.
    #[error("failed to send request: {0}")]
    Request(#[source] reqwest::Error),

    /// The reload response body could not be read.
    #[error("failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// The reload endpoint answered with something other than 200.
    #[error("unexpected status code: {status}, body: {body}")]
    UnexpectedStatus {
        /// HTTP status code returned by the endpoint
        status: u16,
        /// Response body, verbatim
        body: String,
    },
}

impl From<config::ConfigError> for ReloaderError {
    fn from(err: config::ConfigError) -> Self {
        ReloaderError::Settings(err.to_string())
    }
}

impl From<serde_json::Error> for ReloaderError {
    fn from(err: serde_json::Error) -> Self {
        ReloaderError::Settings(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_message() {
        let err = ReloaderError::UnexpectedStatus {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "unexpected status code: 500, body: boom");
    }

    #[test]
    fn test_watch_path_message_names_path() {
        let err = ReloaderError::WatchPath {
            path: PathBuf::from("/etc/provisioning"),
            source: notify::Error::generic("permission denied"),
        };
        assert!(err.to_string().contains("/etc/provisioning"));
    }
}
