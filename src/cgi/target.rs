//! Mapping a request filename to a path inside the storage directory.

use std::path::{Path, PathBuf};

use crate::error::{ChunkedError, Result};

/// Resolve `filename` under `storage_dir`.
///
/// Only plain file names are accepted: no separators, no `..`, no NUL.
pub fn resolve_target(storage_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.is_empty() {
        return Err(ChunkedError::MissingFilename);
    }

    let invalid = filename == "."
        || filename == ".."
        || filename.contains(&['/', '\\', '\0'][..]);
    if invalid {
        return Err(ChunkedError::InvalidFilename(filename.to_string()));
    }

    Ok(storage_dir.join(filename))
}
