//! Error types for schema_scaffold

use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema_scaffold operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema_scaffold
///
/// Every variant is fatal: the generator is a one-shot batch run and never
/// retries against a schema that may have changed in between.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Introspection error{}: {message}", context_suffix(.schema, .table))]
    IntrospectionError {
        message: String,
        schema: Option<String>,
        table: Option<String>,
    },

    #[error("Template error in '{template}': {message}")]
    TemplateError { template: String, message: String },

    #[error("File system error at {}: {source}", .path.display())]
    FileSystemError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid identifier '{0}': only ASCII identifiers can be converted")]
    InvalidIdentifier(String),
}

fn context_suffix(schema: &Option<String>, table: &Option<String>) -> String {
    match (schema, table) {
        (Some(s), Some(t)) => format!(" for '{}.{}'", s, t),
        (Some(s), None) => format!(" in schema '{}'", s),
        (None, Some(t)) => format!(" for '{}'", t),
        (None, None) => String::new(),
    }
}

impl Error {
    /// Build an introspection error scoped to a table
    pub fn introspection(schema: &str, table: &str, message: impl Into<String>) -> Self {
        Error::IntrospectionError {
            message: message.into(),
            schema: Some(schema.to_string()),
            table: Some(table.to_string()),
        }
    }

    /// Build a template error
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Error::TemplateError {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Wrap an io error with the path it happened on
    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileSystemError {
            path: path.into(),
            source,
        }
    }
}

/// Query failures surface as introspection errors without table context
impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        Error::IntrospectionError {
            message: error.to_string(),
            schema: None,
            table: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystemError {
            path: PathBuf::new(),
            source: error,
        }
    }
}

/// Convert TOML deserialization errors to configuration errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(format!("Failed to parse config file: {}", error))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::ConfigError(format!("Failed to parse config file: {}", error))
    }
}

impl From<regex::Error> for Error {
    fn from(error: regex::Error) -> Self {
        Error::ConfigError(format!("invalid table rule: {}", error))
    }
}
