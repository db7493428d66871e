//! Streaming chunk encoder.
//!
//! Frames a body pulled from a reader instead of one held in memory. Each
//! record is read into a single reused buffer that grows only with the bytes
//! actually read, so memory stays within one chunk and never exceeds the
//! body itself.
//!
//! Records are filled completely before they are emitted: a short read does
//! not cut a chunk, only end-of-stream does. Framing a stream therefore gives
//! the same bytes as [`frame`](super::frame) on the whole body.

use std::io::{Read, Write};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::chunk::ChunkRecord;
use super::wire_format::{encode_size_line, validate_chunk_size, CRLF, LAST_CHUNK};
use crate::error::Result;

/// Initial buffer capacity, capped so large chunk sizes allocate lazily.
const INITIAL_BUFFER_SIZE: usize = 64 * 1024;

/// Iterator that frames a `Read` source record by record.
///
/// Yields data records, then the terminal record. After a read error the
/// error is yielded once and the iterator ends without a terminal record.
///
/// # Example
///
/// ```
/// use cgi_chunked::framing::ChunkEncoder;
///
/// let encoder = ChunkEncoder::new(&b"abcde"[..], 2).unwrap();
/// let sizes: Vec<usize> = encoder.map(|r| r.unwrap().data_len()).collect();
/// assert_eq!(sizes, vec![2, 2, 1, 0]);
/// ```
pub struct ChunkEncoder<R> {
    reader: R,
    buf: Vec<u8>,
    max_chunk_size: usize,
    state: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Source may still have data.
    Reading,
    /// Source hit end-of-stream; terminal record still owed.
    Exhausted,
    /// Terminal record emitted or an error was returned.
    Done,
}

impl<R: Read> ChunkEncoder<R> {
    /// Create an encoder reading `max_chunk_size` bytes per record.
    pub fn new(reader: R, max_chunk_size: usize) -> Result<Self> {
        validate_chunk_size(max_chunk_size)?;
        Ok(Self {
            reader,
            buf: chunk_buffer(max_chunk_size),
            max_chunk_size,
            state: State::Reading,
        })
    }

    /// Recover the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for ChunkEncoder<R> {
    type Item = Result<ChunkRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            State::Done => None,
            State::Exhausted => {
                self.state = State::Done;
                Some(Ok(ChunkRecord::terminal()))
            }
            State::Reading => {
                match fill_chunk(&mut self.reader, &mut self.buf, self.max_chunk_size) {
                    Ok(0) => {
                        self.state = State::Done;
                        Some(Ok(ChunkRecord::terminal()))
                    }
                    Ok(n) => {
                        if n < self.max_chunk_size {
                            self.state = State::Exhausted;
                        }
                        Some(Ok(ChunkRecord::from_slice(&self.buf)))
                    }
                    Err(e) => {
                        self.state = State::Done;
                        Some(Err(e.into()))
                    }
                }
            }
        }
    }
}

fn chunk_buffer(max_chunk_size: usize) -> Vec<u8> {
    Vec::with_capacity(max_chunk_size.min(INITIAL_BUFFER_SIZE))
}

fn read_limit(max_chunk_size: usize) -> u64 {
    u64::try_from(max_chunk_size).unwrap_or(u64::MAX)
}

/// Replace `buf` with up to `max_chunk_size` bytes from `reader`.
///
/// Stops early only at end-of-stream. Returns bytes read.
fn fill_chunk<R: Read>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_chunk_size: usize,
) -> std::io::Result<usize> {
    buf.clear();
    (&mut *reader).take(read_limit(max_chunk_size)).read_to_end(buf)
}

/// Async counterpart of [`fill_chunk`].
async fn fill_chunk_async<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_chunk_size: usize,
) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    buf.clear();
    (&mut *reader).take(read_limit(max_chunk_size)).read_to_end(buf).await
}

/// Frame everything from `reader` into `writer`.
///
/// Returns the number of body bytes framed. The terminal record is written
/// only if the whole source was read successfully.
pub fn encode_stream<R, W>(mut reader: R, mut writer: W, max_chunk_size: usize) -> Result<u64>
where
    R: Read,
    W: Write,
{
    validate_chunk_size(max_chunk_size)?;

    let mut buf = chunk_buffer(max_chunk_size);
    let mut total = 0u64;

    loop {
        let n = fill_chunk(&mut reader, &mut buf, max_chunk_size)?;
        if n == 0 {
            break;
        }
        writer.write_all(&encode_size_line(n))?;
        writer.write_all(&buf[..n])?;
        writer.write_all(CRLF)?;
        total += n as u64;

        if n < max_chunk_size {
            break;
        }
    }

    writer.write_all(LAST_CHUNK)?;
    writer.flush()?;
    Ok(total)
}

/// Frame everything from an async `reader` into an async `writer`.
pub async fn encode_stream_async<R, W>(
    mut reader: R,
    mut writer: W,
    max_chunk_size: usize,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    validate_chunk_size(max_chunk_size)?;

    let mut buf = chunk_buffer(max_chunk_size);
    let mut total = 0u64;

    loop {
        let n = fill_chunk_async(&mut reader, &mut buf, max_chunk_size).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&encode_size_line(n)).await?;
        writer.write_all(&buf[..n]).await?;
        writer.write_all(CRLF).await?;
        total += n as u64;

        if n < max_chunk_size {
            break;
        }
    }

    writer.write_all(LAST_CHUNK).await?;
    writer.flush().await?;
    Ok(total)
}
