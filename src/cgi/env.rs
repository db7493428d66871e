//! CGI request metadata read from environment variables.
//!
//! The hosting server passes one variable per meta-variable; anything it
//! leaves unset reads back as the empty string.

use std::collections::BTreeMap;

use serde::Serialize;

/// Meta-variables in the order the environment page lists them.
pub const META_VARIABLES: [&str; 17] = [
    "AUTH_MODE",
    "CONTENT_LENGTH",
    "CONTENT_TYPE",
    "GATEWAY_INTERFACE",
    "PATH_INFO",
    "PATH_TRANSLATED",
    "QUERY_STRING",
    "REMOTE_ADDR",
    "REMOTE_HOST",
    "REMOTE_IDENT",
    "REMOTE_USER",
    "REQUEST_METHOD",
    "SCRIPT_NAME",
    "SERVER_NAME",
    "SERVER_PORT",
    "SERVER_PROTOCOL",
    "SERVER_SOFTWARE",
];

/// Variable the server uses to name an uploaded or deleted file.
pub const FILENAME_VAR: &str = "FILENAME";

/// Snapshot of the CGI variables for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CgiEnv {
    vars: BTreeMap<&'static str, String>,
}

impl CgiEnv {
    /// Read the variables of the current process.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from name/value pairs, keeping only CGI variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, value) in vars {
            if let Some(known) = known_name(name.as_ref()) {
                map.insert(known, value.into());
            }
        }
        Self { vars: map }
    }

    /// Value of a variable, empty if unset or not a CGI variable.
    pub fn get(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or("")
    }

    /// Meta-variables as ordered name/value pairs.
    pub fn meta_variables(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        META_VARIABLES.iter().map(move |&name| (name, self.get(name)))
    }

    /// Target filename set by the server.
    pub fn filename(&self) -> &str {
        self.get(FILENAME_VAR)
    }

    /// Request method, e.g. `POST`.
    pub fn request_method(&self) -> &str {
        self.get("REQUEST_METHOD")
    }

    /// Declared body length, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.get("CONTENT_LENGTH").trim().parse().ok()
    }

    /// First value of `key` in `QUERY_STRING`.
    ///
    /// No percent-decoding is applied.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.get("QUERY_STRING")
            .split('&')
            .filter(|pair| !pair.is_empty())
            .find_map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                (name == key).then_some(value)
            })
    }
}

fn known_name(name: &str) -> Option<&'static str> {
    if name == FILENAME_VAR {
        return Some(FILENAME_VAR);
    }
    META_VARIABLES.iter().copied().find(|&known| known == name)
}
