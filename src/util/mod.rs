use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use thiserror::Error;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static URL_PASSWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z][a-z0-9+.-]*://[^:/@]*):[^@]*@").unwrap());

/// Removes every whitespace character, so `decimal(9, 2)` becomes `decimal(9,2)`.
pub fn strip_whitespace(value: &str) -> Cow<'_, str> {
    WHITESPACE.replace_all(value, "")
}

/// Equality used for every textual facet: byte-identical, or identical once
/// all whitespace is removed from both sides. Case is significant.
pub fn values_equal(expected: Option<&str>, found: Option<&str>) -> bool {
    match (expected, found) {
        (None, None) => true,
        (Some(expected), Some(found)) => {
            expected == found || strip_whitespace(expected) == strip_whitespace(found)
        }
        _ => false,
    }
}

/// Masks the password part of a connection URL.
pub fn sanitize_url(url: &str) -> String {
    URL_PASSWORD.replace(url, "$1:****@").to_string()
}

/// Removes any occurrence of the raw connection string from a driver error.
pub fn sanitize_connection_error(url: &str, message: &str) -> String {
    if url.is_empty() {
        return message.to_string();
    }
    message.replace(url, &sanitize_url(url))
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
