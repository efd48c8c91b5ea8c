use thiserror::Error;

/// Structured error type for schemaprobe library operations.
///
/// Drift is never an error: it is reported through
/// [`CheckResult`](super::CheckResult). These variants abort a run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid model: {message}")]
    InvalidModel { message: String },

    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Introspection failed: {message}")]
    Introspection { message: String },

    #[error("Invalid filter pattern: {pattern}")]
    InvalidFilter { pattern: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Cannot determine database provider for {database_url}; pass a provider explicitly")]
    UnsupportedProvider { database_url: String },

    #[error("Runtime error: {message}")]
    Runtime { message: String },
}

impl Error {
    pub fn invalid_model(message: impl Into<String>) -> Self {
        Self::InvalidModel {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn introspection(message: impl Into<String>) -> Self {
        Self::Introspection {
            message: message.into(),
        }
    }

    pub fn invalid_filter(pattern: impl Into<String>) -> Self {
        Self::InvalidFilter {
            pattern: pattern.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn unsupported_provider(database_url: impl Into<String>) -> Self {
        Self::UnsupportedProvider {
            database_url: database_url.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }
}
