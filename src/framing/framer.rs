//! In-memory chunk framer.
//!
//! Splits a payload into records of at most `max_chunk_size` bytes, in order,
//! and ends with the terminal record. Pure: no I/O, no state between calls.

use std::iter::FusedIterator;

use bytes::Bytes;

use super::chunk::ChunkRecord;
use super::wire_format::{encode_size_line, hex_digits, validate_chunk_size, CRLF, LAST_CHUNK};
use crate::error::{ChunkedError, Result};

/// Frame `payload` as a chunked body.
///
/// Returns one segment per record; the last segment is always `0\r\n\r\n`.
///
/// # Errors
///
/// `InvalidArgument` if `max_chunk_size` is 0. Nothing is produced in that case.
///
/// # Example
///
/// ```
/// use cgi_chunked::framing::frame;
///
/// let segments = frame(b"hello world", 5).unwrap();
/// assert_eq!(&segments[0][..], b"5\r\nhello\r\n");
/// assert_eq!(&segments[1][..], b"5\r\n worl\r\n");
/// assert_eq!(&segments[2][..], b"1\r\nd\r\n");
/// assert_eq!(&segments[3][..], b"0\r\n\r\n");
/// ```
pub fn frame(payload: &[u8], max_chunk_size: usize) -> Result<Vec<Bytes>> {
    let records = records(Bytes::copy_from_slice(payload), max_chunk_size)?;
    Ok(records.map(|record| record.to_bytes()).collect())
}

/// Frame `payload` into one contiguous buffer.
pub fn frame_to_vec(payload: &[u8], max_chunk_size: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(framed_len(payload.len(), max_chunk_size)?);
    for chunk in payload.chunks(max_chunk_size) {
        out.extend_from_slice(&encode_size_line(chunk.len()));
        out.extend_from_slice(chunk);
        out.extend_from_slice(CRLF);
    }
    out.extend_from_slice(LAST_CHUNK);
    Ok(out)
}

/// Lazily iterate the records of `payload`.
///
/// Data records share the payload's allocation.
pub fn records(payload: impl Into<Bytes>, max_chunk_size: usize) -> Result<ChunkRecords> {
    validate_chunk_size(max_chunk_size)?;
    Ok(ChunkRecords {
        payload: payload.into(),
        offset: 0,
        max_chunk_size,
        finished: false,
    })
}

/// Exact size of the framed output for a payload of `payload_len` bytes.
///
/// # Errors
///
/// `InvalidArgument` if `max_chunk_size` is 0 or the size does not fit in
/// `usize`.
pub fn framed_len(payload_len: usize, max_chunk_size: usize) -> Result<usize> {
    validate_chunk_size(max_chunk_size)?;

    let full = payload_len / max_chunk_size;
    let rest = payload_len % max_chunk_size;

    let mut total = LAST_CHUNK.len();
    if full > 0 {
        let full_len = record_len(max_chunk_size)
            .and_then(|len| len.checked_mul(full))
            .ok_or_else(overflow)?;
        total = total.checked_add(full_len).ok_or_else(overflow)?;
    }
    if rest > 0 {
        let rest_len = record_len(rest).ok_or_else(overflow)?;
        total = total.checked_add(rest_len).ok_or_else(overflow)?;
    }
    Ok(total)
}

/// Encoded length of one data record carrying `len` bytes.
fn record_len(len: usize) -> Option<usize> {
    (hex_digits(len) + 2 * CRLF.len()).checked_add(len)
}

fn overflow() -> ChunkedError {
    ChunkedError::InvalidArgument("framed length overflows usize".into())
}

/// Iterator over the chunk records of an in-memory payload.
///
/// Yields `ceil(len / max_chunk_size)` data records followed by exactly one
/// terminal record.
#[derive(Debug, Clone)]
pub struct ChunkRecords {
    payload: Bytes,
    offset: usize,
    max_chunk_size: usize,
    finished: bool,
}

impl ChunkRecords {
    /// Data records not yet yielded.
    fn remaining_data_records(&self) -> usize {
        (self.payload.len() - self.offset).div_ceil(self.max_chunk_size)
    }
}

impl Iterator for ChunkRecords {
    type Item = ChunkRecord;

    fn next(&mut self) -> Option<ChunkRecord> {
        if self.finished {
            return None;
        }

        if self.offset == self.payload.len() {
            self.finished = true;
            return Some(ChunkRecord::terminal());
        }

        let end = self.offset + self.max_chunk_size.min(self.payload.len() - self.offset);
        let data = self.payload.slice(self.offset..end);
        self.offset = end;
        Some(ChunkRecord::new(data))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = if self.finished {
            0
        } else {
            self.remaining_data_records() + 1
        };
        (n, Some(n))
    }
}

impl ExactSizeIterator for ChunkRecords {}

impl FusedIterator for ChunkRecords {}
