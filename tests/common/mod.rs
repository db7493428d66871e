//! Strict chunked-body decoder shared by the integration tests.
//!
//! Rejects anything the framer must never produce: uppercase hex, leading
//! zeros, extensions, trailers, missing CRLFs and bytes after the terminator.

#![allow(dead_code)]

/// A decoded chunked body.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Size of every data chunk, terminator excluded.
    pub sizes: Vec<usize>,
    /// Concatenated chunk data.
    pub payload: Vec<u8>,
}

/// Decode a complete chunked body.
pub fn decode(mut input: &[u8]) -> Result<Decoded, String> {
    let mut decoded = Decoded::default();

    loop {
        let line_end = find_crlf(input).ok_or("size line without CRLF")?;
        let size = parse_size(&input[..line_end])?;
        input = &input[line_end + 2..];

        if size == 0 {
            if input != b"\r\n" {
                return Err(format!("bad terminator tail: {:?}", input));
            }
            return Ok(decoded);
        }

        if input.len() < size + 2 {
            return Err(format!("truncated chunk of {} bytes", size));
        }
        decoded.payload.extend_from_slice(&input[..size]);
        if &input[size..size + 2] != b"\r\n" {
            return Err("chunk data not followed by CRLF".to_string());
        }
        decoded.sizes.push(size);
        input = &input[size + 2..];
    }
}

/// Split a CGI response into its header block and chunked body.
pub fn split_response(response: &[u8]) -> Result<(String, &[u8]), String> {
    let end = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or("no blank line after headers")?;
    let head = String::from_utf8(response[..end + 2].to_vec()).map_err(|e| e.to_string())?;
    Ok((head, &response[end + 4..]))
}

fn find_crlf(input: &[u8]) -> Option<usize> {
    input.windows(2).position(|w| w == b"\r\n")
}

fn parse_size(line: &[u8]) -> Result<usize, String> {
    if line.is_empty() {
        return Err("empty size line".to_string());
    }
    if line.len() > 1 && line[0] == b'0' {
        return Err(format!("leading zero in {:?}", line));
    }
    if !line.iter().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(format!("not lowercase hex: {:?}", line));
    }
    let text = std::str::from_utf8(line).map_err(|e| e.to_string())?;
    usize::from_str_radix(text, 16).map_err(|e| e.to_string())
}
