//! CGI response with a chunked body.
//!
//! Header block first, then the body through the chunk writer task:
//!
//! ```text
//! Status: 200 OK\r\n
//! Content-Type: text/html\r\n
//! Transfer-Encoding: chunked\r\n
//! \r\n
//! <hex>\r\n<data>\r\n ... 0\r\n\r\n
//! ```
//!
//! `Content-Length` is never emitted.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{ChunkedError, Result};
use crate::framing::{frame_to_vec, CRLF};
use crate::writer::{spawn_chunk_writer, WriterConfig};

/// Content type for HTML pages.
pub const TEXT_HTML: &str = "text/html";

/// Content type for JSON bodies.
pub const APPLICATION_JSON: &str = "application/json";

/// Reason phrase for the status codes the CGI programs emit.
///
/// Covers success plus every code [`ChunkedError::status_code`] produces.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// A response ready to be written to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgiResponse {
    status: u16,
    content_type: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl CgiResponse {
    /// Create a 200 response with the given content type.
    pub fn new(content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            content_type: content_type.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Create a 200 HTML response.
    pub fn html(body: impl Into<Bytes>) -> Self {
        Self::new(TEXT_HTML, body)
    }

    /// Create a 200 JSON response.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::new(APPLICATION_JSON, serde_json::to_vec(value)?))
    }

    /// Set the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add an extra header line.
    ///
    /// `Content-Length` and `Transfer-Encoding` are owned by the response and
    /// are ignored here.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if name.eq_ignore_ascii_case("content-length")
            || name.eq_ignore_ascii_case("transfer-encoding")
        {
            tracing::warn!("Ignoring caller-supplied {} header", name);
            return self;
        }
        self.headers.push((name, value.into()));
        self
    }

    /// Status code.
    #[inline]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Content type.
    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Unframed body.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Encoded header block, blank line included.
    pub fn head_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(128);
        put_header(&mut buf, "Status", &format!("{} {}", self.status, reason_phrase(self.status)));
        put_header(&mut buf, "Content-Type", &self.content_type);
        put_header(&mut buf, "Transfer-Encoding", "chunked");
        for (name, value) in &self.headers {
            put_header(&mut buf, name, value);
        }
        buf.put_slice(CRLF);
        buf.freeze()
    }

    /// Full response (head plus framed body) in memory.
    pub fn to_bytes(&self, max_chunk_size: usize) -> Result<Vec<u8>> {
        let framed = frame_to_vec(&self.body, max_chunk_size)?;
        let head = self.head_bytes();
        let mut out = Vec::with_capacity(head.len() + framed.len());
        out.extend_from_slice(&head);
        out.extend_from_slice(&framed);
        Ok(out)
    }

    /// Write the response to `writer`, framing the body as chunks.
    ///
    /// Returns the writer once the terminal chunk has been flushed.
    pub async fn write_chunked<W>(self, mut writer: W, config: WriterConfig) -> Result<W>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        crate::framing::validate_chunk_size(config.max_chunk_size)?;

        writer.write_all(&self.head_bytes()).await?;

        let (handle, task) = spawn_chunk_writer(writer, config)?;
        handle.send(self.body).await?;
        handle.finish();

        let writer = task.await.map_err(|e| {
            tracing::error!("Chunk writer task failed: {}", e);
            ChunkedError::ConnectionClosed
        })??;

        tracing::debug!("Sent {} response", self.status);
        Ok(writer)
    }
}

fn put_header(buf: &mut BytesMut, name: &str, value: &str) {
    buf.put_slice(name.as_bytes());
    buf.put_slice(b": ");
    buf.put_slice(value.as_bytes());
    buf.put_slice(CRLF);
}
