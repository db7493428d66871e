//! Delete handler: remove a previously uploaded file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::pages::{error_page, DELETE_SUCCESS_PAGE};
use super::response::CgiResponse;
use super::target::resolve_target;
use crate::error::{ChunkedError, Result};

/// Removes files from `storage_dir`.
#[derive(Debug, Clone)]
pub struct DeleteHandler {
    storage_dir: PathBuf,
}

impl DeleteHandler {
    /// Create a handler for `storage_dir`.
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    /// Storage directory.
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Delete `filename`. Returns the removed path.
    ///
    /// # Errors
    ///
    /// - `MissingFilename` / `InvalidFilename` for unusable names
    /// - `NotAFile` if the path is a directory
    /// - `FileNotFound` if nothing exists at the path
    pub async fn handle(&self, filename: &str) -> Result<PathBuf> {
        let path = resolve_target(&self.storage_dir, filename)?;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => return Err(ChunkedError::NotAFile(path)),
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ChunkedError::FileNotFound(path))
            }
            Err(e) => return Err(e.into()),
        }

        tokio::fs::remove_file(&path).await?;
        tracing::info!("Deleted {}", path.display());
        Ok(path)
    }

    /// Response for the outcome of [`handle`](Self::handle).
    pub fn respond(result: &Result<PathBuf>) -> CgiResponse {
        match result {
            Ok(_) => CgiResponse::html(DELETE_SUCCESS_PAGE),
            Err(e) => {
                let status = e.status_code();
                tracing::warn!("Delete failed ({}): {}", status, e);
                CgiResponse::html(error_page(status, &e.to_string())).with_status(status)
            }
        }
    }
}
