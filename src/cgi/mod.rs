//! CGI module - per-request programs built on the chunk framer.
//!
//! A CGI program is started once per request. The server passes metadata in
//! environment variables and the body on stdin, and reads the response from
//! stdout.
//!
//! # Workflow
//!
//! 1. Read [`CgiEnv`] from the process environment
//! 2. Run a handler ([`UploadHandler`], [`DeleteHandler`], or [`env_page`])
//! 3. Turn the outcome into a [`CgiResponse`], error pages included
//! 4. Write it to stdout with a chunked body
//!
//! # Example
//!
//! ```ignore
//! use cgi_chunked::cgi::{request_body, write_stdout_response, CgiEnv, UploadHandler};
//! use cgi_chunked::writer::WriterConfig;
//!
//! let env = CgiEnv::from_env();
//! let handler = UploadHandler::new("Data");
//! let result = handler.handle(env.filename(), request_body()).await;
//! write_stdout_response(UploadHandler::respond(&result), WriterConfig::default()).await?;
//! ```

mod delete;
mod env;
mod pages;
mod response;
mod stdio;
mod target;
mod upload;

pub use delete::DeleteHandler;
pub use env::{CgiEnv, FILENAME_VAR, META_VARIABLES};
pub use pages::{env_page, error_page, DELETE_SUCCESS_PAGE, UPLOAD_SUCCESS_PAGE};
pub use response::{reason_phrase, CgiResponse, APPLICATION_JSON, TEXT_HTML};
pub use stdio::{request_body, write_response, write_stdout_response};
pub use target::resolve_target;
pub use upload::{UploadHandler, UploadOutcome, DEFAULT_BUFFER_SIZE};
