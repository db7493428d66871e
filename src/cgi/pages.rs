//! HTML bodies produced by the CGI programs.

use std::fmt::Write;

use super::env::CgiEnv;
use super::response::reason_phrase;

/// Body sent after a successful upload.
pub const UPLOAD_SUCCESS_PAGE: &str =
    "<html><body><h1>Image received and written successfully.</h1></body></html>";

/// Body sent after a successful delete.
pub const DELETE_SUCCESS_PAGE: &str = "<html><body><h1>File deleted successfully.</h1></body></html>";

/// Page listing every CGI meta-variable, values HTML-escaped.
pub fn env_page(env: &CgiEnv) -> String {
    let mut page = String::from("<html><body><h1>CGI environment</h1>\n<ul>\n");
    for (name, value) in env.meta_variables() {
        // writing to a String cannot fail
        let _ = writeln!(
            page,
            "<li>{}={}</li>",
            name,
            html_escape::encode_text(value)
        );
    }
    page.push_str("</ul>\n</body></html>\n");
    page
}

/// Page for a failed request.
pub fn error_page(status: u16, message: &str) -> String {
    format!(
        "<html><body><h1>{} {}</h1><p>{}</p></body></html>",
        status,
        reason_phrase(status),
        html_escape::encode_text(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_page_lists_all_variables() {
        let env = CgiEnv::from_vars([("SERVER_NAME", "localhost"), ("SERVER_PORT", "8002")]);
        let page = env_page(&env);

        assert!(page.starts_with("<html><body>"));
        assert!(page.contains("<li>SERVER_NAME=localhost</li>"));
        assert!(page.contains("<li>SERVER_PORT=8002</li>"));
        assert!(page.contains("<li>AUTH_MODE=</li>"));
        assert_eq!(page.matches("<li>").count(), 17);
    }

    #[test]
    fn test_env_page_escapes_values() {
        let env = CgiEnv::from_vars([("QUERY_STRING", "q=<script>&x=1")]);
        let page = env_page(&env);

        assert!(page.contains("q=&lt;script&gt;&amp;x=1"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_error_page() {
        let page = error_page(404, "File not found: Data/<x>");
        assert!(page.contains("<h1>404 Not Found</h1>"));
        assert!(page.contains("Data/&lt;x&gt;"));
    }

    #[test]
    fn test_upload_success_page_length() {
        assert_eq!(UPLOAD_SUCCESS_PAGE.len(), 0x4b);
    }
}
