use std::path::PathBuf;

use thiserror::Error;

use crate::models::TrackedItemId;

/// Failures talking to, or making sense of, the origin site.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("origin returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("could not parse {page}: {reason}")]
    Parse { page: String, reason: String },
}

/// Failures of the key-value store backing the cache.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("stored value under '{key}' is unreadable: {reason}")]
    Corrupt { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("failed to fetch item {id}")]
    FetchFailure {
        id: TrackedItemId,
        #[source]
        source: FetchError,
    },

    #[error("failed to fetch viewing history")]
    HistoryFailure(#[source] FetchError),

    #[error("'{0}' is a reserved name")]
    ReservedName(String),

    #[error("a list named '{0}' already exists")]
    DuplicateName(String),

    #[error("'{0}' is not a valid list name")]
    InvalidName(String),

    #[error("the default list '{0}' cannot be deleted or renamed")]
    ProtectedList(String),

    #[error("no list named '{0}'")]
    UnknownList(String),

    #[error("item {id} is already in list '{list}'")]
    DuplicateMember { list: String, id: TrackedItemId },

    #[error("item {0} is not cached yet")]
    NotCached(TrackedItemId),

    #[error("rating must be a whole number from 1 to 5, got '{0}'")]
    InvalidRating(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TrackerError {
    /// Fetch failures are the only errors that depend on the origin being reachable.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            TrackerError::FetchFailure { .. } | TrackerError::HistoryFailure(_)
        )
    }
}

/// Display text of an error followed by each of its causes.
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_names_each_cause_once() {
        let error = TrackerError::FetchFailure {
            id: TrackedItemId(2),
            source: FetchError::Status {
                url: "https://example.test/store/ci_pc?workId=2".to_string(),
                status: 503,
            },
        };

        let message = error_chain(&error);

        assert_eq!(
            message,
            "failed to fetch item 2: origin returned HTTP 503 for https://example.test/store/ci_pc?workId=2"
        );
        assert_eq!(message.matches("HTTP 503").count(), 1);
    }

    #[test]
    fn test_error_chain_sees_through_transparent_storage_errors() {
        let error = TrackerError::from(StorageError::Io {
            path: PathBuf::from("/tmp/store.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });

        assert_eq!(error_chain(&error), "I/O error on /tmp/store.json: denied");
    }
}
