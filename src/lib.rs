//! # cgi-chunked
//!
//! HTTP/1.1 chunked transfer-encoding framer and the CGI programs built on it.
//!
//! A payload is cut into records of at most `max_chunk_size` bytes, each
//! written as `<hex length>\r\n<data>\r\n`, and the body ends with `0\r\n\r\n`.
//!
//! ## Architecture
//!
//! - **framing**: pure framer, record iterator and streaming encoders
//! - **writer**: tokio task that owns a transport and writes chunked bodies
//! - **cgi**: request environment, upload / delete handlers and responses
//!
//! ## Example
//!
//! ```
//! let framed = cgi_chunked::frame_to_vec(b"hello", 2).unwrap();
//! assert_eq!(framed, b"2\r\nhe\r\n2\r\nll\r\n1\r\no\r\n0\r\n\r\n");
//! ```

pub mod cgi;
pub mod config;
pub mod error;
pub mod framing;
pub mod logging;
pub mod writer;

pub use config::CgiConfig;
pub use error::{ChunkedError, Result};
pub use framing::{frame, frame_to_vec, ChunkRecord, DEFAULT_MAX_CHUNK_SIZE};
pub use writer::{spawn_chunk_writer, spawn_chunk_writer_default, ChunkWriterHandle, WriterConfig};
