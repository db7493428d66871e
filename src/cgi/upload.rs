//! Upload handler: store the request body under a configured directory.
//!
//! One handler serves every upload script; only the storage directory varies.
//! The body is streamed through a bounded buffer into a temporary file next to
//! the target, which is renamed over the target once complete. A failed upload
//! leaves any previous file untouched.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncWriteExt, BufReader, BufWriter};

use super::pages::{error_page, UPLOAD_SUCCESS_PAGE};
use super::response::CgiResponse;
use super::target::resolve_target;
use crate::error::Result;

/// Default copy buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Result of a stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Where the body was written.
    pub path: PathBuf,
    /// Number of body bytes written.
    pub bytes_written: u64,
}

/// Writes request bodies into `storage_dir`.
#[derive(Debug, Clone)]
pub struct UploadHandler {
    storage_dir: PathBuf,
    buffer_size: usize,
}

impl UploadHandler {
    /// Create a handler for `storage_dir`.
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Set the copy buffer size. Values of 0 are raised to 1.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Storage directory.
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Store `body` as `filename`, replacing any existing file.
    ///
    /// The storage directory is created if it does not exist.
    pub async fn handle<R>(&self, filename: &str, body: R) -> Result<UploadOutcome>
    where
        R: AsyncRead + Unpin,
    {
        let path = resolve_target(&self.storage_dir, filename)?;
        tokio::fs::create_dir_all(&self.storage_dir).await?;

        let partial = self.partial_path(filename);
        let written = match self.write_partial(&partial, body).await {
            Ok(n) => tokio::fs::rename(&partial, &path).await.map(|()| n),
            Err(e) => Err(e),
        };

        let bytes_written = match written {
            Ok(n) => n,
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    tracing::debug!("Could not remove {}: {}", partial.display(), cleanup);
                }
                return Err(e.into());
            }
        };

        tracing::info!("Stored upload {} ({} bytes)", path.display(), bytes_written);
        Ok(UploadOutcome {
            path,
            bytes_written,
        })
    }

    /// Temporary path the body is written to before the rename.
    fn partial_path(&self, filename: &str) -> PathBuf {
        self.storage_dir
            .join(format!(".{}.{}.part", filename, std::process::id()))
    }

    async fn write_partial<R>(&self, partial: &Path, body: R) -> std::io::Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let file = tokio::fs::File::create(partial).await?;

        let mut reader = BufReader::with_capacity(self.buffer_size, body);
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);
        let bytes_written = tokio::io::copy_buf(&mut reader, &mut writer).await?;
        writer.flush().await?;
        writer.into_inner().sync_all().await?;
        Ok(bytes_written)
    }

    /// Response for the outcome of [`handle`](Self::handle).
    ///
    /// Failures still produce a complete HTML page.
    pub fn respond(result: &Result<UploadOutcome>) -> CgiResponse {
        match result {
            Ok(_) => CgiResponse::html(UPLOAD_SUCCESS_PAGE),
            Err(e) => {
                let status = e.status_code();
                tracing::warn!("Upload failed ({}): {}", status, e);
                CgiResponse::html(error_page(status, &e.to_string())).with_status(status)
            }
        }
    }
}
