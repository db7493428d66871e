//! Error types for cgi-chunked.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for all framing and CGI operations.
#[derive(Debug, Error)]
pub enum ChunkedError {
    /// Caller passed an unusable argument (e.g. a chunk size of 0).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error while reading a body or writing a response.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request did not name a target file.
    #[error("Filename is not provided")]
    MissingFilename,

    /// The filename would escape the storage directory or is otherwise unusable.
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    /// The target path exists but is a directory.
    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// The target file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Writer task has gone away.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Backpressure timeout - too many buffers pending.
    #[error("Backpressure timeout")]
    BackpressureTimeout,
}

impl ChunkedError {
    /// HTTP status code a CGI response should carry for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ChunkedError::InvalidArgument(_)
            | ChunkedError::MissingFilename
            | ChunkedError::InvalidFilename(_)
            | ChunkedError::NotAFile(_) => 400,
            ChunkedError::FileNotFound(_) => 404,
            ChunkedError::BackpressureTimeout => 503,
            ChunkedError::Io(_) | ChunkedError::Json(_) | ChunkedError::ConnectionClosed => 500,
        }
    }
}

/// Result type alias using ChunkedError.
pub type Result<T> = std::result::Result<T, ChunkedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ChunkedError::MissingFilename.status_code(), 400);
        assert_eq!(
            ChunkedError::InvalidFilename("../x".into()).status_code(),
            400
        );
        assert_eq!(
            ChunkedError::FileNotFound(PathBuf::from("Data/a")).status_code(),
            404
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(ChunkedError::from(io).status_code(), 500);
    }

    #[test]
    fn test_display_messages() {
        let err = ChunkedError::InvalidArgument("max_chunk_size must be positive".into());
        assert_eq!(
            err.to_string(),
            "Invalid argument: max_chunk_size must be positive"
        );
        assert_eq!(
            ChunkedError::NotAFile(PathBuf::from("Data/dir")).to_string(),
            "Not a file: Data/dir"
        );
    }
}
