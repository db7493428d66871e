//! Framing module - chunked transfer-encoding output.
//!
//! This module implements the response-body side of HTTP/1.1 chunked encoding:
//! - Size line encoding and wire constants
//! - Chunk records with zero-copy data
//! - In-memory framer and streaming encoder
//!
//! Decoding an incoming chunked request body is not handled here.

mod chunk;
mod encoder;
mod framer;
mod wire_format;

pub use chunk::ChunkRecord;
pub use encoder::{encode_stream, encode_stream_async, ChunkEncoder};
pub use framer::{frame, frame_to_vec, framed_len, records, ChunkRecords};
pub use wire_format::{
    encode_size_line, hex_digits, validate_chunk_size, SizeLine, CRLF, DEFAULT_MAX_CHUNK_SIZE,
    LAST_CHUNK, MAX_SIZE_LINE_LEN,
};
