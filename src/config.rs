//! Runtime configuration for the CGI programs.
//!
//! Values come from the process environment, with a fluent builder for
//! embedding and tests:
//!
//! | Variable         | Default | Meaning                    |
//! |------------------|---------|----------------------------|
//! | `CGI_DATA_DIR`   | `Data`  | upload / delete directory  |
//! | `CGI_CHUNK_SIZE` | `1024`  | largest response chunk     |

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ChunkedError, Result};
use crate::framing::validate_chunk_size;
use crate::writer::WriterConfig;

/// Environment variable naming the storage directory.
pub const DATA_DIR_VAR: &str = "CGI_DATA_DIR";

/// Environment variable holding the response chunk size.
pub const CHUNK_SIZE_VAR: &str = "CGI_CHUNK_SIZE";

/// Default storage directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "Data";

/// Configuration shared by the CGI binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgiConfig {
    /// Directory uploads are written to and deleted from.
    pub data_dir: PathBuf,
    /// Writer task settings, response chunk size included.
    pub writer: WriterConfig,
}

impl Default for CgiConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            writer: WriterConfig::default(),
        }
    }
}

impl CgiConfig {
    /// Start a builder from the defaults.
    pub fn builder() -> CgiConfigBuilder {
        CgiConfigBuilder::new()
    }

    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `CGI_CHUNK_SIZE` is set but is not a
    /// positive integer.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = CgiConfigBuilder::new();

        if let Some(dir) = lookup(DATA_DIR_VAR).filter(|d| !d.is_empty()) {
            builder = builder.data_dir(dir);
        }
        if let Some(raw) = lookup(CHUNK_SIZE_VAR) {
            builder = builder.max_chunk_size(parse_chunk_size(&raw)?);
        }

        builder.build()
    }

    /// Largest chunk written in a response body.
    #[inline]
    pub fn max_chunk_size(&self) -> usize {
        self.writer.max_chunk_size
    }

    /// Writer settings for a response.
    pub fn writer_config(&self) -> WriterConfig {
        self.writer.clone()
    }
}

/// Parse a chunk size given as text.
///
/// Signed input is accepted so that `0` and negatives are reported as
/// invalid values rather than parse failures.
pub fn parse_chunk_size(raw: &str) -> Result<usize> {
    let value: i64 = raw.trim().parse().map_err(|_| {
        ChunkedError::InvalidArgument(format!("chunk size is not an integer: {:?}", raw))
    })?;

    if value <= 0 {
        return Err(ChunkedError::InvalidArgument(format!(
            "max_chunk_size must be a positive integer, got {}",
            value
        )));
    }

    usize::try_from(value)
        .map_err(|_| ChunkedError::InvalidArgument(format!("chunk size too large: {}", value)))
}

/// Builder for [`CgiConfig`].
#[derive(Debug, Clone)]
pub struct CgiConfigBuilder {
    config: CgiConfig,
}

impl CgiConfigBuilder {
    /// Create a builder with default values.
    pub fn new() -> Self {
        Self {
            config: CgiConfig::default(),
        }
    }

    /// Set the storage directory.
    ///
    /// Default: `Data`
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Set the largest response chunk.
    ///
    /// Default: 1024
    pub fn max_chunk_size(mut self, size: usize) -> Self {
        self.config.writer.max_chunk_size = size;
        self
    }

    /// Set the maximum pending buffers for backpressure.
    ///
    /// Default: 1024
    pub fn max_pending(mut self, limit: usize) -> Self {
        self.config.writer.max_pending = limit;
        self
    }

    /// Set the writer channel capacity.
    ///
    /// Default: 1024
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.writer.channel_capacity = capacity;
        self
    }

    /// Set the backpressure timeout.
    ///
    /// Default: 5 seconds
    pub fn backpressure_timeout(mut self, timeout: Duration) -> Self {
        self.config.writer.backpressure_timeout = timeout;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<CgiConfig> {
        validate_chunk_size(self.config.writer.max_chunk_size)?;
        if self.config.writer.channel_capacity == 0 {
            return Err(ChunkedError::InvalidArgument(
                "channel_capacity must be a positive integer".to_string(),
            ));
        }

        Ok(self.config)
    }
}

impl Default for CgiConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
