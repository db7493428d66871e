//! CGI program that reports its request environment.
//!
//! Renders an HTML list of the meta-variables, or JSON when the query string
//! carries `format=json`.

use cgi_chunked::cgi::{env_page, error_page, write_stdout_response, CgiEnv, CgiResponse};
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

    let response = if env.query_param("format") == Some("json") {
        CgiResponse::json(&env).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize environment: {}", e);
            CgiResponse::html(error_page(e.status_code(), &e.to_string())).with_status(e.status_code())
        })
    } else {
        CgiResponse::html(env_page(&env))
    };

    write_stdout_response(response, config.writer_config()).await
}
