//! Error types for the review analysis pipeline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A package id that does not follow the reverse-DNS naming convention.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid app id {value:?}: {reason}")]
pub struct InvalidAppId {
    pub value: String,
    pub reason: &'static str,
}

/// Failure reported by a fetch collaborator. Never retried by the pipeline.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("app not found: {0}")]
    NotFound(String),

    #[error("scraper returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Http(err)
        }
    }
}

/// The raw review batch itself has the wrong shape. Individual bad entries
/// never produce this.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("malformed review batch: {reason}")]
    MalformedBatch { reason: String },
}

/// Coarse classification of a [`WriteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteErrorKind {
    PermissionDenied,
    DiskFull,
    SerializationFailure,
    Io,
}

/// Failure while rendering the distribution chart in memory.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("bundled chart font could not be loaded")]
    Font,

    #[error("chart drawing failed: {0}")]
    Draw(String),

    #[error("chart buffer does not match the canvas size")]
    Buffer,
}

/// Failure while persisting an artifact.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("permission denied writing {path}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("disk full writing {path}")]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize {path}: {message}")]
    SerializationFailure { path: PathBuf, message: String },

    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    /// Classifies an I/O failure on `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::PermissionDenied => WriteError::PermissionDenied { path, source },
            io::ErrorKind::StorageFull => WriteError::DiskFull { path, source },
            _ => WriteError::Io { path, source },
        }
    }

    pub fn serialization(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        WriteError::SerializationFailure {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> WriteErrorKind {
        match self {
            WriteError::PermissionDenied { .. } => WriteErrorKind::PermissionDenied,
            WriteError::DiskFull { .. } => WriteErrorKind::DiskFull,
            WriteError::SerializationFailure { .. } => WriteErrorKind::SerializationFailure,
            WriteError::Io { .. } => WriteErrorKind::Io,
        }
    }
}

/// Any stage-fatal error the orchestrator can surface.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    InvalidAppId(#[from] InvalidAppId),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_classifies_io_kinds() {
        let denied = WriteError::from_io(
            "out/x.csv",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert_eq!(denied.kind(), WriteErrorKind::PermissionDenied);

        let full = WriteError::from_io("out/x.csv", io::Error::from(io::ErrorKind::StorageFull));
        assert_eq!(full.kind(), WriteErrorKind::DiskFull);

        let other = WriteError::from_io("out/x.csv", io::Error::other("boom"));
        assert_eq!(other.kind(), WriteErrorKind::Io);
    }

    #[test]
    fn test_write_error_message_names_path() {
        let err = WriteError::serialization("out/app_details.json", "bad value");
        assert_eq!(err.to_string(), "failed to serialize out/app_details.json: bad value");
        assert_eq!(err.kind(), WriteErrorKind::SerializationFailure);
    }
}
