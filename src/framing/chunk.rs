//! Single chunk record: size line, data, trailing CRLF.
//!
//! Data is held as `bytes::Bytes`, so records cut from one payload share
//! its allocation.
//!
//! # Example
//!
//! ```
//! use cgi_chunked::framing::ChunkRecord;
//! use bytes::Bytes;
//!
//! let record = ChunkRecord::new(Bytes::from_static(b"hello"));
//! assert_eq!(&record.to_bytes()[..], b"5\r\nhello\r\n");
//! assert!(ChunkRecord::terminal().is_terminal());
//! ```

use std::io::IoSlice;

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{encode_size_line, SizeLine, CRLF};

/// One encoded chunk of a chunked body.
///
/// A record with empty data is the terminal record (`0\r\n\r\n`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    size_line: SizeLine,
    data: Bytes,
}

impl ChunkRecord {
    /// Create a record around `data`.
    pub fn new(data: Bytes) -> Self {
        Self {
            size_line: encode_size_line(data.len()),
            data,
        }
    }

    /// Create a record from a slice (copies data).
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// The zero-size record that ends a body.
    pub fn terminal() -> Self {
        Self::new(Bytes::new())
    }

    /// Check if this is the end-of-body marker.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.data.is_empty()
    }

    /// Encoded size line, CRLF included.
    #[inline]
    pub fn size_line(&self) -> &[u8] {
        self.size_line.as_bytes()
    }

    /// Chunk data.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a clone of the data as Bytes (cheap, zero-copy).
    #[inline]
    pub fn data_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Number of payload bytes carried.
    #[inline]
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes this record takes on the wire.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        self.size_line.len() + self.data.len() + CRLF.len()
    }

    /// Append the encoded record to `buf`.
    pub fn write_into(&self, buf: &mut Vec<u8>) {
        buf.reserve(self.encoded_len());
        buf.extend_from_slice(self.size_line());
        buf.extend_from_slice(&self.data);
        buf.extend_from_slice(CRLF);
    }

    /// Encode the record into one contiguous buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_slice(self.size_line());
        buf.put_slice(&self.data);
        buf.put_slice(CRLF);
        buf.freeze()
    }

    /// The three wire parts: size line, data, CRLF.
    ///
    /// The data part is empty for the terminal record.
    pub fn parts(&self) -> [&[u8]; 3] {
        [self.size_line(), &self.data, CRLF]
    }

    /// Wire parts as `IoSlice`s for vectored writes.
    pub fn io_slices(&self) -> [IoSlice<'_>; 3] {
        self.parts().map(IoSlice::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let record = ChunkRecord::new(Bytes::from_static(b"hello"));

        assert_eq!(record.size_line(), b"5\r\n");
        assert_eq!(record.data(), b"hello");
        assert_eq!(record.data_len(), 5);
        assert_eq!(record.encoded_len(), 3 + 5 + 2);
        assert!(!record.is_terminal());
    }

    #[test]
    fn test_terminal_record() {
        let record = ChunkRecord::terminal();

        assert!(record.is_terminal());
        assert_eq!(&record.to_bytes()[..], b"0\r\n\r\n");
        assert_eq!(record.encoded_len(), 5);
    }

    #[test]
    fn test_from_slice_copies() {
        let source = vec![0x41u8; 20];
        let record = ChunkRecord::from_slice(&source);

        assert_eq!(record.size_line(), b"14\r\n");
        assert_eq!(record.data(), &source[..]);
    }

    #[test]
    fn test_write_into_appends() {
        let mut buf = b"prefix".to_vec();
        ChunkRecord::new(Bytes::from_static(b"abc")).write_into(&mut buf);

        assert_eq!(&buf[..], b"prefix3\r\nabc\r\n");
    }

    #[test]
    fn test_to_bytes_matches_write_into() {
        let record = ChunkRecord::new(Bytes::from(vec![7u8; 300]));
        let mut buf = Vec::new();
        record.write_into(&mut buf);

        assert_eq!(&record.to_bytes()[..], &buf[..]);
        assert!(buf.starts_with(b"12c\r\n"));
        assert!(buf.ends_with(b"\r\n"));
    }

    #[test]
    fn test_data_bytes_zero_copy() {
        let original = Bytes::from_static(b"shared");
        let record = ChunkRecord::new(original.clone());

        assert_eq!(record.data_bytes().as_ptr(), original.as_ptr());
    }

    #[test]
    fn test_io_slices_cover_encoding() {
        let record = ChunkRecord::new(Bytes::from_static(b"hi"));
        let slices = record.io_slices();

        let joined: Vec<u8> = slices.iter().flat_map(|s| s.iter().copied()).collect();
        assert_eq!(&joined[..], b"2\r\nhi\r\n");
    }
}
