//! Stdio for CGI programs.
//!
//! # Important
//!
//! - **stdin**: request body, already de-chunked by the server
//! - **stdout**: the response, nothing else
//! - **stderr**: logs and debug output (not read by the server)
//! - **Never use `println!`**: any stray stdout line corrupts the response

use tokio::io::{AsyncWrite, Stdin};

use super::response::CgiResponse;
use crate::error::Result;
use crate::writer::WriterConfig;

/// Request body stream.
pub fn request_body() -> Stdin {
    tokio::io::stdin()
}

/// Write `response` to stdout with a chunked body.
///
/// # Errors
///
/// Returns error if the chunk size is invalid or the write fails.
pub async fn write_stdout_response(response: CgiResponse, config: WriterConfig) -> Result<()> {
    write_response(tokio::io::stdout(), response, config).await
}

/// Write `response` to any transport.
pub async fn write_response<W>(writer: W, response: CgiResponse, config: WriterConfig) -> Result<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    response.write_chunked(writer, config).await?;
    Ok(())
}
