//! Error types for the pulse survey export pipeline.
//!
//! Every failure class in the pipeline maps to one variant here, and every
//! error propagates uncaught to the process boundary: there is no local
//! recovery or retry. Messages never include private key material, tokens,
//! or other credentials.

use thiserror::Error;

/// Main error type for pulse survey export operations.
///
/// # Security
/// All error messages are sanitized to prevent credential leakage. Key
/// material and bearer tokens are never included in error output.
#[derive(Debug, Error)]
pub enum PulseSurveyError {
    /// A required secret is absent from the environment (fatal at startup)
    #[error("Missing required credential: {variable} must be set and non-empty")]
    MissingCredential {
        /// Name of the missing environment variable
        variable: String,
    },

    /// Private key material could not be decoded (fatal at startup)
    #[error("Private key format error: {context}")]
    KeyFormat {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication or network setup failed while opening the session
    #[error("Snowflake connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Server-side failure executing the report statement
    #[error("Query execution failed: {context}")]
    Query { context: String },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O failure creating the output directory or writing a report file
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization failure while writing a report file
    #[error("CSV write failed: {context}")]
    Csv {
        context: String,
        #[source]
        source: csv::Error,
    },

    /// Statement response could not be decoded
    #[error("Response decoding failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with `PulseSurveyError`
pub type Result<T> = std::result::Result<T, PulseSurveyError>;

impl PulseSurveyError {
    /// Creates a `MissingCredential` error for the named environment variable.
    pub fn missing_credential(variable: impl Into<String>) -> Self {
        Self::MissingCredential {
            variable: variable.into(),
        }
    }

    /// Creates a `KeyFormat` error with context only.
    pub fn key_format(context: impl Into<String>) -> Self {
        Self::KeyFormat {
            context: context.into(),
            source: None,
        }
    }

    /// Creates a `KeyFormat` error wrapping an underlying decode failure.
    pub fn key_format_with(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::KeyFormat {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a `Connection` error with context only.
    pub fn connection(context: impl Into<String>) -> Self {
        Self::Connection {
            context: context.into(),
            source: None,
        }
    }

    /// Creates a `Connection` error wrapping an underlying transport failure.
    pub fn connection_failed(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a `Query` error with server context.
    pub fn query_failed(context: impl Into<String>) -> Self {
        Self::Query {
            context: context.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an `Io` error with path context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a `Csv` error with file context.
    pub fn csv(context: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            context: context.into(),
            source,
        }
    }

    /// Creates a `Serialization` error with decode context.
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }
}
