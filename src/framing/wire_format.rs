//! Chunked transfer-encoding wire format.
//!
//! Every chunk record is laid out as:
//! ```text
//! ┌──────────────────┬──────┬──────────────┬──────┐
//! │ size (hex ASCII) │ CRLF │ chunk bytes  │ CRLF │
//! │ 1-16 bytes       │ 2    │ size bytes   │ 2    │
//! └──────────────────┴──────┴──────────────┴──────┘
//! ```
//!
//! The body ends with the zero-size record `0\r\n\r\n`. Sizes are lowercase
//! hex with no leading zeros. No chunk extensions, no trailers.

use std::ops::Deref;

use crate::error::{ChunkedError, Result};

/// Line terminator used by every part of the encoding.
pub const CRLF: &[u8; 2] = b"\r\n";

/// The zero-size record that ends a chunked body.
pub const LAST_CHUNK: &[u8; 5] = b"0\r\n\r\n";

/// Default maximum chunk size (1 KiB).
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1024;

/// Longest possible size line: 16 hex digits of a 64-bit length plus CRLF.
pub const MAX_SIZE_LINE_LEN: usize = 18;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Encoded size line (`<hex>\r\n`) held in a stack buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLine {
    buf: [u8; MAX_SIZE_LINE_LEN],
    len: u8,
}

impl SizeLine {
    /// Encoded bytes, CRLF included.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// The hex digits without the CRLF.
    #[inline]
    pub fn hex(&self) -> &[u8] {
        &self.buf[..self.len as usize - CRLF.len()]
    }
}

impl Deref for SizeLine {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for SizeLine {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Encode a chunk length as a size line.
///
/// # Example
///
/// ```
/// use cgi_chunked::framing::encode_size_line;
///
/// assert_eq!(&encode_size_line(1024)[..], b"400\r\n");
/// assert_eq!(&encode_size_line(0)[..], b"0\r\n");
/// ```
pub fn encode_size_line(len: usize) -> SizeLine {
    let mut digits = [0u8; 16];
    let mut n = len as u64;
    let mut start = digits.len();
    loop {
        start -= 1;
        digits[start] = HEX_DIGITS[(n & 0xf) as usize];
        n >>= 4;
        if n == 0 {
            break;
        }
    }

    let hex = &digits[start..];
    let mut buf = [0u8; MAX_SIZE_LINE_LEN];
    buf[..hex.len()].copy_from_slice(hex);
    buf[hex.len()..hex.len() + CRLF.len()].copy_from_slice(CRLF);

    SizeLine {
        buf,
        len: (hex.len() + CRLF.len()) as u8,
    }
}

/// Number of hex digits needed to write `len`.
#[inline]
pub fn hex_digits(len: usize) -> usize {
    if len == 0 {
        1
    } else {
        (usize::BITS - len.leading_zeros()).div_ceil(4) as usize
    }
}

/// Reject a chunk size that cannot frame anything.
pub fn validate_chunk_size(max_chunk_size: usize) -> Result<()> {
    if max_chunk_size == 0 {
        return Err(ChunkedError::InvalidArgument(
            "max_chunk_size must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_line_lowercase_hex() {
        assert_eq!(&encode_size_line(0xab)[..], b"ab\r\n");
        assert_eq!(&encode_size_line(0x4b)[..], b"4b\r\n");
        assert_eq!(&encode_size_line(0xdeadbeef)[..], b"deadbeef\r\n");
    }

    #[test]
    fn test_size_line_no_leading_zeros() {
        assert_eq!(&encode_size_line(1)[..], b"1\r\n");
        assert_eq!(&encode_size_line(16)[..], b"10\r\n");
        assert_eq!(encode_size_line(0x400).hex(), b"400");
    }

    #[test]
    fn test_size_line_zero_is_single_digit() {
        assert_eq!(&encode_size_line(0)[..], b"0\r\n");
    }

    #[test]
    fn test_size_line_max_value_fits() {
        let line = encode_size_line(usize::MAX);
        assert!(line.len() <= MAX_SIZE_LINE_LEN);
        assert!(line.hex().iter().all(|&b| b == b'f'));
    }

    #[test]
    fn test_hex_digits_matches_encoding() {
        for len in [0usize, 1, 15, 16, 255, 256, 1023, 1024, 65535, 65536] {
            assert_eq!(hex_digits(len), encode_size_line(len).hex().len(), "len {}", len);
        }
    }

    #[test]
    fn test_validate_chunk_size_zero_rejected() {
        let result = validate_chunk_size(0);
        assert!(matches!(result, Err(ChunkedError::InvalidArgument(_))));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must be a positive integer"));
    }

    #[test]
    fn test_validate_chunk_size_positive_accepted() {
        assert!(validate_chunk_size(1).is_ok());
        assert!(validate_chunk_size(DEFAULT_MAX_CHUNK_SIZE).is_ok());
    }

    #[test]
    fn test_last_chunk_constant() {
        assert_eq!(LAST_CHUNK, b"0\r\n\r\n");
    }
}
