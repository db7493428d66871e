//! CGI program that removes `$FILENAME` from the data directory.

use cgi_chunked::cgi::{write_stdout_response, CgiEnv, DeleteHandler};
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

    let handler = DeleteHandler::new(&config.data_dir);
    let result = handler.handle(env.filename()).await;

    write_stdout_response(DeleteHandler::respond(&result), config.writer_config()).await
}
