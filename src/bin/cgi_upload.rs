//! CGI program that stores the request body as `$FILENAME` in the data
//! directory.

use cgi_chunked::cgi::{request_body, write_stdout_response, CgiEnv, UploadHandler};
use cgi_chunked::logging::init_stderr_logging;
use cgi_chunked::CgiConfig;

#[tokio::main]
async fn main() -> cgi_chunked::Result<()> {
    init_stderr_logging();

    let config = CgiConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Invalid configuration, using defaults: {}", e);
        CgiConfig::default()
    });
    let env = CgiEnv::from_env();
    tracing::debug!(
        "{} upload of {:?} ({:?} bytes declared)",
        env.request_method(),
        env.filename(),
        env.content_length()
    );

    let handler = UploadHandler::new(&config.data_dir);
    let result = handler.handle(env.filename(), request_body()).await;

    write_stdout_response(UploadHandler::respond(&result), config.writer_config()).await
}
